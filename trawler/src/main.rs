//! trawler - query XML documents with CSS selectors
//!
//! This is the main CLI entry point that compiles the selector once and
//! runs it over every input.

mod cli;

use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};
use trawler_core::{
    expand_globs, format_matches, output::ansi, output::should_use_color, timing_stats,
    trawl_document, trawl_files_parallel, Document, Match, OutputFormat, OutputOptions,
    SelectorCache, TrawlOptions,
};

use clap::Parser;
use cli::Args;

/// Split a slice into exponentially growing batches, capped at a maximum.
/// Batch sizes: n, 2n, 4n, 8n, 8n, 8n... (where n = num_threads)
fn exponential_batches<T>(items: &[T], num_threads: usize) -> Vec<&[T]> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut batch_size = num_threads.max(1);
    let max_batch_size = num_threads.max(1) * 8;

    while start < items.len() {
        let end = (start + batch_size).min(items.len());
        batches.push(&items[start..end]);
        start = end;
        batch_size = (batch_size * 2).min(max_batch_size);
    }

    batches
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("error: {:#}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: Args) -> Result<()> {
    let format: OutputFormat = args.output.parse().map_err(|_| {
        anyhow!(
            "invalid format '{}'. Valid formats: {}",
            args.output,
            OutputFormat::valid_formats().join(", ")
        )
    })?;
    let expectation = args.expect.as_deref().map(Expectation::parse).transpose()?;

    // Compile up front so a bad selector fails before any input is read
    let cache = Arc::new(SelectorCache::new());
    let compiled = cache.get_or_compile(&args.selector)?;
    if args.compile {
        println!("{}", compiled.xpath());
        return Ok(());
    }

    let use_color = !args.no_color && should_use_color(&args.color);
    let files = expand_globs(&args.files);
    let trawl = TrawlOptions {
        selector: args.selector.clone(),
        attr: args.attr.clone(),
        unique: args.unique,
        verbose: args.verbose,
    };
    let options = OutputOptions { use_color, with_filename: files.len() > 1 };

    // With an expectation, matches are only shown when it fails
    let mut printer = Printer::new(format, options, args.limit, expectation.is_none());

    if files.is_empty() {
        if atty::is(atty::Stream::Stdin) {
            bail!("no input: pass XML files or pipe a document on stdin");
        }
        let mut xml = String::new();
        io::stdin().read_to_string(&mut xml).context("reading stdin")?;
        let document = Document::from_xml(&xml)?
            .with_cache(Arc::clone(&cache))
            .with_verbose(args.verbose);
        printer.push(trawl_document(&document, "<stdin>", &trawl)?);
    } else {
        let concurrency = args.concurrency.unwrap_or_else(num_cpus::get);
        rayon::ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .build_global()
            .ok();

        for batch in exponential_batches(&files, concurrency) {
            if printer.is_full() {
                break;
            }
            for (file, result) in batch.iter().zip(trawl_files_parallel(batch, &trawl, &cache)) {
                match result {
                    Ok(matches) => printer.push(matches),
                    Err(e) => warn!("skipping {}: {}", file, e),
                }
            }
        }
    }

    let total = printer.finish();
    if args.verbose {
        info!("{}", timing_stats().summary());
    }

    match expectation {
        Some(expectation) => expectation.report(total, &printer.render_collected(), use_color),
        None => Ok(()),
    }
}

/// Streams formatted matches to stdout, honoring `--limit`
struct Printer {
    format: OutputFormat,
    options: OutputOptions,
    remaining: Option<usize>,
    total: usize,
    stream: bool,
    collected: Vec<Match>,
}

impl Printer {
    fn new(format: OutputFormat, options: OutputOptions, limit: Option<usize>, stream: bool) -> Self {
        Printer { format, options, remaining: limit, total: 0, stream, collected: Vec::new() }
    }

    fn is_full(&self) -> bool {
        self.remaining == Some(0)
    }

    fn push(&mut self, mut matches: Vec<Match>) {
        if let Some(remaining) = self.remaining {
            matches.truncate(remaining);
            self.remaining = Some(remaining - matches.len());
        }
        self.total += matches.len();

        // Count format only prints the total at the end
        if self.stream && self.format != OutputFormat::Count {
            print!("{}", format_matches(&matches, self.format, &self.options));
            io::stdout().flush().ok();
        } else {
            self.collected.extend(matches);
        }
    }

    fn finish(&self) -> usize {
        if self.stream && self.format == OutputFormat::Count {
            println!("{}", self.total);
        }
        self.total
    }

    /// Matches held back from streaming, rendered without color
    fn render_collected(&self) -> String {
        let options = OutputOptions { use_color: false, ..self.options.clone() };
        let format = match self.format {
            OutputFormat::Count => OutputFormat::Paths,
            format => format,
        };
        format_matches(&self.collected, format, &options)
    }
}

/// `--expect` argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expectation {
    None,
    Some,
    Exactly(usize),
}

impl Expectation {
    fn parse(expect: &str) -> Result<Self> {
        match expect {
            "none" => Ok(Expectation::None),
            "some" => Ok(Expectation::Some),
            _ => expect
                .parse()
                .map(Expectation::Exactly)
                .map_err(|_| anyhow!("invalid expectation '{}': use 'none', 'some', or a number", expect)),
        }
    }

    fn is_met(self, count: usize) -> bool {
        match self {
            Expectation::None => count == 0,
            Expectation::Some => count > 0,
            Expectation::Exactly(expected) => count == expected,
        }
    }

    fn describe(self) -> String {
        match self {
            Expectation::None => "none".to_string(),
            Expectation::Some => "some".to_string(),
            Expectation::Exactly(expected) => expected.to_string(),
        }
    }

    /// Print the result line; on failure list the matches and return an error
    fn report(self, count: usize, matches: &str, use_color: bool) -> Result<()> {
        let passed = self.is_met(count);
        let (symbol, color) = if passed { ("✓", ansi::GREEN) } else { ("✗", ansi::RED) };

        if use_color {
            println!("{}{}{} {} matches{}", ansi::BOLD, color, symbol, count, ansi::RESET);
        } else {
            println!("{} {} matches", symbol, count);
        }

        if passed {
            return Ok(());
        }
        for line in matches.lines() {
            println!("  {}", line);
        }
        bail!("expectation failed: expected {}, got {} matches", self.describe(), count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_batches() {
        let items: Vec<usize> = (0..40).collect();
        let sizes: Vec<usize> = exponential_batches(&items, 2).iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![2, 4, 8, 16, 10]);
        assert!(exponential_batches::<usize>(&[], 4).is_empty());
    }

    #[test]
    fn test_expectation_parse() {
        assert_eq!(Expectation::parse("none").unwrap(), Expectation::None);
        assert_eq!(Expectation::parse("some").unwrap(), Expectation::Some);
        assert_eq!(Expectation::parse("3").unwrap(), Expectation::Exactly(3));
        assert!(Expectation::parse("many").is_err());
    }

    #[test]
    fn test_expectation_is_met() {
        assert!(Expectation::None.is_met(0));
        assert!(!Expectation::None.is_met(1));
        assert!(Expectation::Some.is_met(2));
        assert!(Expectation::Exactly(2).is_met(2));
        assert!(!Expectation::Exactly(2).is_met(3));
    }

    #[test]
    fn test_printer_limit() {
        let options = OutputOptions::default();
        let mut printer = Printer::new(OutputFormat::Text, options, Some(3), false);
        let batch = |n: usize| -> Vec<Match> {
            (0..n).map(|i| Match::new("f.xml".to_string(), i.to_string())).collect()
        };

        printer.push(batch(2));
        assert!(!printer.is_full());
        printer.push(batch(5));
        assert!(printer.is_full());
        assert_eq!(printer.finish(), 3);
        assert_eq!(printer.render_collected(), "0\n1\n0\n");
    }
}
