use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use markspan::{Config, Mark, RenderOptions, Rendered, StyleSheet};

#[derive(Parser)]
#[command(name = "markspan")]
#[command(about = "Render Markdown into plain text with style annotations")]
struct Cli {
    /// Input Markdown file
    input: PathBuf,

    /// Style sheet config (TOML). Missing files fall back to the defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Render soft line breaks as spaces instead of newlines
    #[arg(long)]
    soft_breaks_as_spaces: bool,

    /// Print the parsed document tree before the rendering
    #[arg(long)]
    tree: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let markdown = fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::compiled_default(),
    };
    let options = RenderOptions {
        soft_breaks_as_hard_breaks: config.render.soft_breaks_as_hard_breaks
            && !cli.soft_breaks_as_spaces,
        ..config.render.clone()
    };
    let style = StyleSheet::new(config);

    let document = markspan::parse(&markdown);
    markspan::log_tree(&document);
    if cli.tree {
        print!("{}", markspan::print_tree(&document));
        println!();
    }

    let rendered = markspan::render_with_options(&document, &style, options)
        .context("rendering document")?;
    print_rendered(&rendered);
    Ok(())
}

fn print_rendered(rendered: &Rendered) {
    println!("{}", rendered.text);
    println!();
    for annotation in &rendered.annotations {
        let range = format!("{}..{}", annotation.start(), annotation.end());
        match &annotation.mark {
            Mark::Span(span) => {
                let directives: Vec<String> =
                    span.directives().iter().map(ToString::to_string).collect();
                println!(
                    "{range:<12}{:<8}{:<20}{}",
                    format!("{:?}", span.priority()),
                    span.kind().name(),
                    directives.join(", ")
                );
            }
            Mark::Layout(directive) => {
                println!("{range:<12}{:<8}{:<20}{directive}", "-", "layout");
            }
        }
    }
}
