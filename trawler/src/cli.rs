//! CLI argument parsing using clap

use clap::Parser;

/// Query XML documents with CSS selectors
#[derive(Parser, Debug)]
#[command(name = "trawler")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Text of every second list item
    trawler "docs/**/*.xml" -s "ul > li:nth-child(2n)" -o text

    # Link targets, one per line
    trawler page.xml -s "a[href^='https://']" -a href

    # Show the XPath a selector compiles to
    trawler -s "div.note > p:first-of-type" --compile

    # CI: fail unless exactly one <title> exists
    cat page.xml | trawler -s "head > title" --expect 1
"#)]
pub struct Args {
    /// Files to process (supports glob patterns like "docs/**/*.xml"); reads stdin when empty
    #[arg()]
    pub files: Vec<String>,

    /// CSS selector
    #[arg(short = 's', long = "selector")]
    pub selector: String,

    /// Print the compiled XPath expression and exit
    #[arg(short = 'x', long = "compile")]
    pub compile: bool,

    /// Output format: xml (default), text, count, json, paths
    #[arg(short = 'o', long = "output", default_value = "xml")]
    pub output: String,

    /// Print this attribute of each match instead of the node
    #[arg(short = 'a', long = "attr")]
    pub attr: Option<String>,

    /// Drop nodes matched more than once
    #[arg(short = 'u', long = "unique")]
    pub unique: bool,

    /// Limit output to first N matches
    #[arg(short = 'n', long = "limit")]
    pub limit: Option<usize>,

    /// Expected result: none, some, or a number (exit 1 if not met)
    #[arg(short = 'e', long = "expect")]
    pub expect: Option<String>,

    /// Color output: auto (default), always, never
    #[arg(long = "color", default_value = "auto")]
    pub color: String,

    /// Disable color output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Number of parallel workers
    #[arg(short = 'c', long = "concurrency")]
    pub concurrency: Option<usize>,

    /// Show verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}
