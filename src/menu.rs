//! Interactive Menu Module
//! The text menu loop consuming the query engine. Pure I/O orchestration:
//! prompt, title-case the input, run the query, render the result.

use std::io::{self, BufRead, Write};

use crate::data::title_case;
use crate::stats::{DetailedStats, GroupMean, QueryEngine, QueryResult};

pub fn run(engine: &QueryEngine) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        println!();
        println!("--- Global Protein Analyzer ---");
        println!("1. Protein stats by country");
        println!("2. Protein stats by category");
        println!("3. Detailed stats for one category");
        println!("4. Exit");
        print!("Enter your choice: ");
        io::stdout().flush()?;

        // EOF on stdin ends the session like an explicit exit.
        let Some(choice) = lines.next().transpose()? else {
            break;
        };

        match choice.trim() {
            "1" => {
                let Some(country) = prompt(&mut lines, "Enter country (e.g., France, United States): ")?
                else {
                    break;
                };
                println!("--- Average protein (g) per category ---");
                render_groups(engine.mean_protein_by_country(&country)?);
            }
            "2" => {
                let Some(category) =
                    prompt(&mut lines, "Enter category (e.g., Meats, Snacks, Beverages): ")?
                else {
                    break;
                };
                println!("--- Average protein (g) by country ---");
                render_groups(engine.mean_protein_by_category(&category)?);
            }
            "3" => {
                let Some(category) =
                    prompt(&mut lines, "Enter category (e.g., Meats, Snacks, Beverages): ")?
                else {
                    break;
                };
                render_detailed(&category, engine.detailed_stats(&category)?);
            }
            "4" => {
                println!("Exiting. Goodbye!");
                break;
            }
            other => println!("Invalid choice '{}'. Please try again.", other),
        }
    }

    Ok(())
}

/// Prompt for free text and title-case it to match the canonical values the
/// cleaner stored. Returns `None` on EOF.
fn prompt(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    message: &str,
) -> anyhow::Result<Option<String>> {
    print!("{}", message);
    io::stdout().flush()?;
    Ok(lines
        .next()
        .transpose()?
        .map(|line| title_case(line.trim())))
}

fn render_groups(result: QueryResult<Vec<GroupMean>>) {
    match result {
        QueryResult::Found(means) => {
            for GroupMean {
                group,
                mean_protein,
            } in means
            {
                println!("{:<20} {:>8.2} g", group, mean_protein);
            }
        }
        QueryResult::NoData { subject } => println!("No data found for {}.", subject),
    }
}

fn render_detailed(category: &str, result: QueryResult<DetailedStats>) {
    match result {
        QueryResult::Found(stats) => {
            println!("--- Detailed stats for {} ---", category);
            println!("Total products analyzed: {}", stats.count);
            println!("Mean protein:   {:.2} g", stats.mean);
            println!("Median protein: {:.2} g", stats.median);
            println!("Std. deviation: {:.2} g", stats.std_dev);
        }
        QueryResult::NoData { subject } => println!("No data found for {}.", subject),
    }
}
