//! Interactive dump viewer
//!
//! A rustyline loop that redraws the records around the cursor after every
//! command. Commands:
//! - `k` / `up`: previous record
//! - `j` / `down`: next record
//! - `g <pos>`: jump to a position
//! - `e` / `export`: write the current record to a JSON file
//! - `r` / `refresh`: pick up records appended since the viewer started
//! - `q` / `quit`: leave

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use snapdump::{DumpConfig, JsonExporter, Navigator, View};

use crate::{render, PRECEDES_LOG};

pub struct Viewer {
    navigator: Navigator,
    editor: DefaultEditor,
    exporter: JsonExporter,
    radius: usize,
}

impl Viewer {
    pub fn new(navigator: Navigator, config: &DumpConfig) -> Result<Self> {
        let editor = DefaultEditor::new().context("Failed to start line editor")?;
        Ok(Self {
            navigator,
            editor,
            exporter: JsonExporter::new(config.export_dir.clone()),
            radius: config.window_radius,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        println!("{} records. Type 'help' for commands.", self.navigator.len());
        if self.navigator.precedes_log() {
            println!("{PRECEDES_LOG}");
        }
        self.draw()?;

        loop {
            match self.editor.readline("snapdump> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(line);

                    if line == "q" || line == "quit" {
                        break;
                    }
                    if let Err(e) = self.execute(line) {
                        eprintln!("Error: {:#}", e);
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error reading line: {}", err);
                    break;
                }
            }
        }
        Ok(())
    }

    fn execute(&mut self, line: &str) -> Result<()> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["k"] | ["up"] => {
                self.navigator.up();
            }
            ["j"] | ["down"] => {
                self.navigator.down();
            }
            ["g", position] | ["goto", position] => {
                let position: u64 = position
                    .parse()
                    .with_context(|| format!("Invalid position {position:?}"))?;
                self.navigator.seek(position)?;
            }
            ["e"] | ["export"] => {
                match self.navigator.export(&mut self.exporter)? {
                    Some(path) => println!("Exported to {}", path.display()),
                    None => println!("Nothing to export"),
                }
                return Ok(());
            }
            ["r"] | ["refresh"] => {
                let len = self.navigator.refresh()?;
                println!("{len} records");
            }
            ["help"] => {
                Self::print_help();
                return Ok(());
            }
            _ => {
                println!("Unknown command: {line}");
                println!("Type 'help' for available commands");
                return Ok(());
            }
        }
        self.draw()
    }

    fn draw(&self) -> Result<()> {
        let center = self.navigator.position();
        println!();
        for view in self.navigator.window(self.radius)? {
            let current = matches!(view, View::Record { position, .. } if position == center);
            println!("{}", render(&view, current));
        }
        println!();
        Ok(())
    }

    fn print_help() {
        println!("Commands:");
        println!("  k, up          previous record");
        println!("  j, down        next record");
        println!("  g <pos>        jump to position");
        println!("  e, export      export current record as JSON");
        println!("  r, refresh     reload the record count");
        println!("  q, quit        leave the viewer");
    }
}
