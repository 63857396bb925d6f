//! Interactive session: collects a selection, shows the statistics, offers raw
//! rows five at a time, and asks whether to start over.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use bikeshare_explorer::browse::BrowseCursor;
use bikeshare_explorer::city::City;
use bikeshare_explorer::filter::{DayFilter, FilterCriteria, MonthFilter, filter};
use bikeshare_explorer::source::CityResolver;
use bikeshare_explorer::stats::StatisticsReport;
use bikeshare_explorer::trips::TripStore;
use tracing::warn;

const RULE: &str = "----------------------------------------";
const MORE_ROWS: &str = "Would you like to see 5 rows of individual trip data? Enter yes or no.";

/// Line-oriented question/answer over any reader and writer.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{text}")?;
        self.output.flush()
    }

    /// Asks a question and returns the trimmed answer, or `None` at end of input.
    pub fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        writeln!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// True only for an explicit "yes".
    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        Ok(self
            .ask(question)?
            .is_some_and(|a| a.eq_ignore_ascii_case("yes")))
    }

    /// Asks until the answer parses, or returns `None` at end of input.
    fn ask_until<T>(
        &mut self,
        question: &str,
        parse: impl Fn(&str) -> Option<T>,
        complaint: &str,
    ) -> io::Result<Option<T>> {
        loop {
            let Some(answer) = self.ask(question)? else {
                return Ok(None);
            };
            match parse(&answer) {
                Some(value) => return Ok(Some(value)),
                None => self.say(complaint)?,
            }
        }
    }

    /// Collects a city and at most one of month or day.
    pub fn collect_criteria(&mut self) -> io::Result<Option<FilterCriteria>> {
        let Some(city) = self.ask_until(
            "Which city would you like to explore?\n Chicago, New York, or Washington",
            |s| s.parse::<City>().ok(),
            "I do not have any data on that city. Please enter a valid city.",
        )?
        else {
            return Ok(None);
        };

        loop {
            let question = "Would you like to filter the data by month, day, or none?";
            let Some(choice) = self.ask(question)? else {
                return Ok(None);
            };

            match choice.to_ascii_lowercase().as_str() {
                "month" => {
                    let month = self.ask_until(
                        "Which month? January, February, March, April, May, June, or all",
                        |s| s.parse::<MonthFilter>().ok(),
                        "Please enter a valid month.",
                    )?;
                    return Ok(month.map(|m| FilterCriteria::new(city, m, DayFilter::All)));
                }
                "day" => {
                    let day = self.ask_until(
                        "Which day? Sunday, Monday, Tuesday, Wednesday, Thursday, Friday, \
                         Saturday, or all",
                        |s| s.parse::<DayFilter>().ok(),
                        "Please enter a valid day.",
                    )?;
                    return Ok(day.map(|d| FilterCriteria::new(city, MonthFilter::All, d)));
                }
                "none" => return Ok(Some(FilterCriteria::all(city))),
                _ => self.say("Please answer month, day, or none.")?,
            }
        }
    }
}

/// Runs selection, statistics, and browsing rounds until the operator stops.
///
/// Stores are loaded once per city for the whole session. Load and filter
/// failures are reported and the operator may start over.
pub async fn run_explore<R, W>(
    resolver: &dyn CityResolver,
    prompter: &mut Prompter<R, W>,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    let mut stores: HashMap<City, TripStore> = HashMap::new();

    prompter.say("Hello! Let's explore some US bikeshare data.")?;

    loop {
        let Some(criteria) = prompter.collect_criteria()? else {
            break;
        };
        prompter.say(format!("You selected {criteria}."))?;
        prompter.say(RULE)?;

        let store = match stores.entry(criteria.city) {
            Entry::Occupied(e) => Some(e.into_mut()),
            Entry::Vacant(e) => match TripStore::load(resolver, criteria.city).await {
                Ok(store) => Some(e.insert(store)),
                Err(err) => {
                    warn!(error = %err, "Trip data could not be loaded");
                    prompter.say(format!("Sorry, {err}"))?;
                    None
                }
            },
        };

        if let Some(store) = store {
            match filter(store, &criteria) {
                Ok(dataset) => {
                    let dataset = Arc::new(dataset);
                    let report = StatisticsReport::compute(Arc::clone(&dataset)).await?;
                    prompter.say(&report)?;

                    let mut cursor = BrowseCursor::new();
                    while !cursor.is_exhausted(&dataset) && prompter.confirm(MORE_ROWS)? {
                        let page = cursor.next_page(&dataset);
                        prompter.say(&page)?;
                    }
                }
                Err(err) => prompter.say(format!("Sorry, {err}"))?,
            }
        }

        if !prompter.confirm("Would you like to restart? Enter yes or no.")? {
            break;
        }
    }

    prompter.say("Thank you for exploring the bikeshare data. Have a great day!")?;
    Ok(())
}
