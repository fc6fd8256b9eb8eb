//! Console oracle: asks the user to pick a category on stdin
//!
//! Stdin is read on a helper thread so a pending prompt can still notice
//! Ctrl-C through the shared interrupt flag.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tally_core::{CategoryOracle, Interrupt, OracleAnswer, TransactionContext};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct ConsoleOracle<W> {
    input: Receiver<String>,
    output: W,
    grid_width: usize,
    interrupt: Interrupt,
}

impl ConsoleOracle<io::Stdout> {
    /// Prompt on stdout, read answers from stdin
    pub fn stdin(grid_width: usize, interrupt: Interrupt) -> Self {
        let (tx, rx) = mpsc::channel();

        // Detached: it may stay blocked on stdin until the process exits
        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        Self::new(rx, io::stdout(), grid_width, interrupt)
    }
}

impl<W: Write> ConsoleOracle<W> {
    pub fn new(input: Receiver<String>, output: W, grid_width: usize, interrupt: Interrupt) -> Self {
        Self {
            input,
            output,
            grid_width: grid_width.max(1),
            interrupt,
        }
    }

    fn prompt(&mut self, context: &TransactionContext<'_>, vocabulary: &[&str]) -> io::Result<()> {
        let amount = |a: Option<f64>| a.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".into());

        writeln!(self.output)?;
        writeln!(self.output, "❓ Unclassified transaction: {}", context.name)?;
        writeln!(
            self.output,
            "   Date: {}   Debit: {}   Credit: {}   File: {}",
            context.date,
            amount(context.debit),
            amount(context.credit),
            context.source
        )?;
        writeln!(
            self.output,
            "   ─────────────────────────────────────────────────────────────"
        )?;
        write!(self.output, "{}", render_grid(vocabulary, self.grid_width))?;
        write!(self.output, "Category number (anything else to skip): ")?;
        self.output.flush()
    }

    /// Wait for a line of input, giving up if the run is interrupted
    fn read_answer(&mut self) -> OracleAnswer {
        loop {
            if self.interrupt.is_triggered() {
                return OracleAnswer::Interrupted;
            }

            match self.input.recv_timeout(POLL_INTERVAL) {
                Ok(line) => return parse_answer(&line),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    // Closed input counts as a request to stop
                    self.interrupt.trigger();
                    return OracleAnswer::Interrupted;
                }
            }
        }
    }
}

impl<W: Write> CategoryOracle for ConsoleOracle<W> {
    fn ask_category(
        &mut self,
        context: &TransactionContext<'_>,
        vocabulary: &[&str],
    ) -> OracleAnswer {
        if self.interrupt.is_triggered() {
            return OracleAnswer::Interrupted;
        }
        if self.prompt(context, vocabulary).is_err() {
            self.interrupt.trigger();
            return OracleAnswer::Interrupted;
        }
        self.read_answer()
    }
}

/// A number picks a category; anything else skips the transaction
pub fn parse_answer(line: &str) -> OracleAnswer {
    match line.trim().parse::<usize>() {
        Ok(index) => OracleAnswer::Choice(index),
        Err(_) => OracleAnswer::Cancelled,
    }
}

/// Vocabulary as `N. Category` entries, `width` per line, in aligned columns
pub fn render_grid(vocabulary: &[&str], width: usize) -> String {
    let entries: Vec<String> = vocabulary
        .iter()
        .enumerate()
        .map(|(i, category)| format!("{}. {}", i, category))
        .collect();
    let column = entries.iter().map(|e| e.chars().count()).max().unwrap_or(0) + 2;

    let mut grid = String::new();
    for row in entries.chunks(width.max(1)) {
        let line: String = row
            .iter()
            .map(|entry| format!("{:<column$}", entry, column = column))
            .collect();
        grid.push_str("   ");
        grid.push_str(line.trim_end());
        grid.push('\n');
    }
    grid
}
