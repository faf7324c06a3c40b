//! A small CLI tool for printing published awards results from a JSON dump
//! of the current-edition query. Tallying uses the same code as the server.

use std::fs::File;
use std::io::BufReader;

use clap::{Arg, ArgAction, ArgMatches, Command};
use rocket::serde::json::serde_json;
use serde::Deserialize;

use bench_awards::model::{
    awards::Awards,
    results::{tally, CategoryResults, OptionTally},
};

const PROGRAM_NAME: &str = "awards-results";

const ABOUT_TEXT: &str = "Print the published results of a Bench Promos awards edition.

EXIT CODES:
     0: Results printed.
     2: Ran successfully, but results are not published yet.
 Other: Error.";

const DUMP_PATH: &str = "DUMP_PATH";

const DUMP_PATH_HELP: &str = "The path to a JSON dump of the `CurrentAwards` query,\n\
either the full GraphQL response or just the `currentAwards` object";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME).about(ABOUT_TEXT).arg(
        Arg::new(DUMP_PATH)
            .help(DUMP_PATH_HELP)
            .action(ArgAction::Set)
            .required(true),
    )
}

/// Errors that this program may produce.
#[derive(Debug, Eq, PartialEq)]
enum Error {
    /// IO error described by the inner message.
    IO(String),
    /// Failed to decode the JSON dump.
    Format(String),
    /// The edition of this year has not published its results.
    NotPublished(i32),
}

/// The accepted dump shapes.
#[derive(Deserialize)]
#[serde(untagged)]
enum Dump {
    Response { data: DumpData },
    Bare(Awards),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DumpData {
    current_awards: Option<Awards>,
}

/// Load the edition from a dump file.
fn load(path: &str) -> Result<Awards, Error> {
    let file = BufReader::new(File::open(path).map_err(|e| Error::IO(e.to_string()))?);
    let dump: Dump = serde_json::from_reader(file).map_err(|e| Error::Format(e.to_string()))?;
    match dump {
        Dump::Bare(awards) => Ok(awards),
        Dump::Response { data } => data
            .current_awards
            .ok_or_else(|| Error::Format("the dump contains no awards edition".to_string())),
    }
}

/// Load and tally an edition.
fn results(path: &str) -> Result<(i32, Vec<CategoryResults>), Error> {
    let awards = load(path)?;
    if !awards.show_results {
        return Err(Error::NotPublished(awards.year));
    }
    Ok((awards.year, tally(&awards)))
}

fn plural(n: u64) -> &'static str {
    if n != 1 {
        "s"
    } else {
        ""
    }
}

fn option_line(option: &OptionTally) -> String {
    format!(
        "{} {}: {} vote{} ({:.1}%)",
        if option.winner { "*" } else { " " },
        option.title,
        option.votes,
        plural(option.votes),
        option.share
    )
}

fn category_lines(category: &CategoryResults) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({} vote{})",
        category.title,
        category.total_votes,
        plural(category.total_votes)
    )];
    lines.extend(category.options.iter().map(|option| format!("  {}", option_line(option))));
    lines
}

/// Print the results and return the exit code.
fn run(args: &ArgMatches) -> u8 {
    let path: &String = args.get_one(DUMP_PATH).unwrap(); // Required argument is guaranteed to be present.
    match results(path) {
        Ok((year, categories)) => {
            println!("Bench Promos Awards {year} results");
            for category in &categories {
                println!();
                for line in category_lines(category) {
                    println!("{line}");
                }
            }
            0
        }
        Err(Error::IO(msg)) => {
            println!("IO error: {msg}");
            1
        }
        Err(Error::Format(msg)) => {
            println!("Invalid dump: {msg}");
            1
        }
        Err(Error::NotPublished(year)) => {
            println!("Results for the {year} awards have not been published yet.");
            2
        }
    }
}

fn main() {
    let args = cli().get_matches();
    let exit_code = run(&args);
    std::process::exit(exit_code.into())
}
