//! Tabula CLI - interactive spreadsheet shell

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use tabula::column_to_letters;
use tabula::prelude::*;

/// Rendered width of a table cell
const CELL_WIDTH: usize = 12;

#[derive(Parser)]
#[command(name = "tabula")]
#[command(author, version, about = "Interactive spreadsheet shell")]
struct Cli {
    /// Run commands from a file before reading from stdin
    #[arg(short, long)]
    script: Option<PathBuf>,
}

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut sheet = Sheet::new();

    if let Some(path) = &cli.script {
        let file =
            File::open(path).with_context(|| format!("Failed to open '{}'", path.display()))?;
        for line in BufReader::new(file).lines() {
            let line = line.with_context(|| format!("Failed to read '{}'", path.display()))?;
            if run_line(&mut sheet, &line)? == Flow::Quit {
                return Ok(());
            }
        }
    }

    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        if run_line(&mut sheet, &line)? == Flow::Quit {
            break;
        }
    }

    Ok(())
}

fn run_line(sheet: &mut Sheet, line: &str) -> Result<Flow> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Flow::Continue);
    }

    let (command, args) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim_start()),
        None => (trimmed, ""),
    };

    match command {
        "quite" => return Ok(Flow::Quit),
        "help" => print_instructions(),
        "set" => set_command(sheet, args),
        "clear" => clear_command(sheet, args),
        "print" => print_command(sheet, args)?,
        other => eprintln!("'{}' is not a spreadsheet command, see 'help'", other),
    }

    Ok(Flow::Continue)
}

fn set_command(sheet: &mut Sheet, args: &str) {
    let (pos_str, rest) = match args.split_once(char::is_whitespace) {
        Some((pos_str, rest)) => (pos_str, rest.trim_start()),
        None => (args, ""),
    };

    let pos = match Position::parse(pos_str) {
        Ok(pos) => pos,
        Err(_) => {
            eprintln!("error: invalid position");
            return;
        }
    };

    let text = match parse_quoted(rest) {
        Some(text) => text,
        None => {
            eprintln!("error, missing quote");
            return;
        }
    };

    match sheet.set_cell(pos, &text) {
        Ok(()) => {}
        Err(Error::InvalidPosition(_)) => eprintln!("error: invalid position"),
        Err(Error::FormulaParse(_)) => eprintln!("error: invalid formula"),
        Err(Error::CircularReference(_)) => eprintln!("error: circular dependency"),
    }
}

fn clear_command(sheet: &mut Sheet, args: &str) {
    let pos_str = args.split_whitespace().next().unwrap_or("");
    match Position::parse(pos_str) {
        Ok(pos) => {
            if sheet.clear_cell(pos).is_err() {
                eprintln!("error: invalid position");
            }
        }
        Err(_) => eprintln!("error: invalid position"),
    }
}

fn print_command(sheet: &Sheet, args: &str) -> Result<()> {
    let arg = args.split_whitespace().next().unwrap_or("");
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match arg {
        "-v" => {
            write_table(sheet, &mut out, |cell| cell.value(sheet).to_string())
                .context("Failed to write to stdout")?;
        }
        "-t" => {
            write_table(sheet, &mut out, |cell| cell.text())
                .context("Failed to write to stdout")?;
        }
        flag if flag.starts_with('-') => {
            eprintln!("'{}' is not a spreadsheet command, see 'help'", flag)
        }
        pos_str => match Position::parse(pos_str) {
            Ok(pos) => {
                let text = sheet
                    .cell(pos)
                    .ok()
                    .flatten()
                    .map(|cell| cell.text())
                    .unwrap_or_default();
                let value = sheet.value(pos).unwrap_or_default();
                println!("Value: {}; Text: {}", value, text);
            }
            Err(_) => eprintln!("error: invalid position"),
        },
    }

    Ok(())
}

/// Extract the text between the first pair of double quotes
fn parse_quoted(input: &str) -> Option<String> {
    let rest = input.strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

// === Table rendering ===

fn write_table<W: Write>(
    sheet: &Sheet,
    out: &mut W,
    render: impl Fn(&Cell) -> String,
) -> io::Result<()> {
    let size = sheet.printable_size();
    let header_width = digits(size.rows);

    write!(out, "{}|", " ".repeat(header_width))?;
    for col in 0..size.cols {
        write!(
            out,
            "{:>width$}|",
            column_to_letters(col),
            width = CELL_WIDTH
        )?;
    }
    writeln!(out)?;

    let boundary = boundary(header_width, size.cols);
    writeln!(out, "{}", boundary)?;

    for row in 0..size.rows {
        write!(out, "{:>width$}|", row + 1, width = header_width)?;
        for col in 0..size.cols {
            match sheet.cell(Position::new(row, col)).ok().flatten() {
                Some(cell) => write!(out, "{}|", clip(&render(cell)))?,
                None => write!(out, "{}|", " ".repeat(CELL_WIDTH))?,
            }
        }
        writeln!(out)?;
        writeln!(out, "{}", boundary)?;
    }

    Ok(())
}

fn boundary(header_width: usize, cols: u32) -> String {
    let mut line = "-".repeat(header_width);
    line.push('|');
    for _ in 0..cols {
        line.push_str(&"-".repeat(CELL_WIDTH));
        line.push('|');
    }
    line
}

/// Right-align into the cell width; truncate long content to 9 chars + "..."
fn clip(content: &str) -> String {
    if content.chars().count() <= CELL_WIDTH {
        format!("{:>width$}", content, width = CELL_WIDTH)
    } else {
        let head: String = content.chars().take(CELL_WIDTH - 3).collect();
        format!("{}...", head)
    }
}

fn digits(mut n: u32) -> usize {
    let mut result = 0;
    while n > 0 {
        n /= 10;
        result += 1;
    }
    result
}

fn print_instructions() {
    println!("Common spreadsheet commands:");
    println!("--------------------------------------------------------------------------");
    println!("  set       Sets a value in a new or existing cell.");
    println!("            Input format: set 'cell position' \"cell contents\"");
    println!("            Example: set A1 \"=5 + 10\"");
    println!("--------------------------------------------------------------------------");
    println!("  print     Prints the contents of the specified cell or the entire table.");
    println!("            Input format for print specified cell: print 'cell position'");
    println!("            Additional commands:");
    println!("        -v  Prints a table showing the values in the cells");
    println!("        -t  Prints a table with text in the cells");
    println!("--------------------------------------------------------------------------");
    println!("  clear     Clears the cell value.");
    println!("            Input format : clear 'cell position'");
    println!("--------------------------------------------------------------------------");
    println!("  quite     Exit the program.");
    println!("--------------------------------------------------------------------------");
}
