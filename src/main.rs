//! Logicsim - digital logic circuit tool
//!
//! Reads a circuit from HDL source or a saved design and simulates,
//! tabulates, converts or arranges it.
//!
//! # Usage
//!
//! ```bash
//! logicsim table half_adder.v
//! logicsim simulate half_adder.v --set a=1,b=0
//! logicsim generate design.json --netlist -o design.v
//! logicsim layout half_adder.v -o half_adder.json
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::{info, warn, LevelFilter};
use logicsim_core::{
    circuit::{design, Circuit, GateId},
    error::{LogicError, Result},
    hdl::{self, Diagnostic, GeneratorOptions},
    layout::{self, LayoutConfig},
    sim::{propagate, SimConfig, TruthTable},
};

/// Digital logic circuit simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse HDL source and report ports, cells and diagnostics
    Parse {
        /// HDL source file
        file: PathBuf,
    },

    /// Print the truth table
    Table {
        /// HDL source or saved design (.json)
        file: PathBuf,

        /// Emit JSON instead of a text table
        #[arg(long)]
        json: bool,
    },

    /// Generate HDL source from a circuit
    Generate {
        /// HDL source or saved design (.json)
        file: PathBuf,

        /// Emit gate primitives instead of assignments
        #[arg(long)]
        netlist: bool,

        /// Module name for the generated source
        #[arg(short, long)]
        module_name: Option<String>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Propagate one input assignment and print every output
    Simulate {
        /// HDL source or saved design (.json)
        file: PathBuf,

        /// Input values, e.g. `a=1,b=0`
        #[arg(long, value_delimiter = ',', value_parser = parse_assignment)]
        set: Vec<(String, bool)>,

        /// Iteration cap
        #[arg(long, default_value_t = logicsim_core::sim::INTERACTIVE_MAX_ITERATIONS)]
        max_iterations: usize,
    },

    /// Arrange a circuit by topological level and save it as a design
    Layout {
        /// HDL source or saved design (.json)
        file: PathBuf,

        /// Design file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Canvas width
        #[arg(long, default_value_t = 1200.0)]
        width: f64,

        /// Canvas height
        #[arg(long, default_value_t = 800.0)]
        height: f64,
    },
}

fn parse_assignment(text: &str) -> std::result::Result<(String, bool), String> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=0|1, got '{}'", text))?;
    let value = hdl::parse_bit(value.trim()).ok_or_else(|| format!("'{}' is not 0 or 1", value))?;
    Ok((name.trim().to_string(), value))
}

/// A circuit plus the names its ports are known by.
struct Loaded {
    circuit: Circuit,
    inputs: Vec<(String, GateId)>,
    outputs: Vec<(String, GateId)>,
}

fn report(diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        warn!("{}", d);
    }
}

fn load(path: &Path) -> Result<Loaded> {
    if path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("json")) {
        let circuit = design::load_file(path)?;
        let named = |ids: Vec<GateId>| -> Vec<(String, GateId)> { ids.into_iter().map(|id| (id.to_string(), id)).collect() };
        let inputs = named(circuit.input_gates().map(|g| g.id).collect());
        let outputs = named(circuit.output_gates().map(|g| g.id).collect());
        return Ok(Loaded {
            circuit,
            inputs,
            outputs,
        });
    }

    let elaboration = hdl::load_file(path)?;
    report(&elaboration.diagnostics);
    Ok(Loaded {
        circuit: elaboration.circuit,
        inputs: elaboration.inputs,
        outputs: elaboration.outputs,
    })
}

fn write_or_print(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text).map_err(|e| LogicError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        }),
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    match cli.command {
        Command::Parse { file } => {
            let parsed = hdl::parse_file(&file)?;
            let module = &parsed.module;
            println!("module {}", module.name);
            println!("  inputs:  {}", module.inputs.join(", "));
            println!("  outputs: {}", module.outputs.join(", "));
            if !module.wires.is_empty() {
                println!("  wires:   {}", module.wires.join(", "));
            }
            for cell in &module.cells {
                let operands: Vec<String> = cell.inputs.iter().map(|o| o.to_string()).collect();
                println!("  line {:>3}: {} = {}({})", cell.line, cell.output, cell.kind, operands.join(", "));
            }
            for d in &parsed.diagnostics {
                println!("{}", d);
            }
        }

        Command::Table { file, json } => {
            let mut loaded = load(&file)?;
            let table = TruthTable::generate(&mut loaded.circuit)?;
            if json {
                println!("{}", table.to_json()?);
            } else {
                print!("{}", table.render());
            }
        }

        Command::Generate {
            file,
            netlist,
            module_name,
            output,
        } => {
            let loaded = load(&file)?;
            let text = if netlist {
                let name = module_name.as_deref().unwrap_or(hdl::DEFAULT_NETLIST_MODULE);
                hdl::generate_netlist(&loaded.circuit, name)
            } else {
                let mut options = GeneratorOptions::default();
                if let Some(name) = module_name {
                    options.module_name = name;
                }
                hdl::generate(&loaded.circuit, &options)
            };
            write_or_print(output.as_deref(), &text)?;
        }

        Command::Simulate {
            file,
            set,
            max_iterations,
        } => {
            let mut loaded = load(&file)?;
            for (name, value) in &set {
                match loaded.inputs.iter().find(|(n, _)| n == name) {
                    Some(&(_, id)) => loaded.circuit.set_input(id, *value)?,
                    None => warn!("no input named '{}'", name),
                }
            }

            let config = SimConfig::interactive().with_max_iterations(max_iterations);
            let outcome = propagate(&mut loaded.circuit, config);
            info!(
                "{} iteration(s), {}",
                outcome.iterations,
                if outcome.converged { "settled" } else { "did not settle" }
            );
            for (name, id) in &loaded.outputs {
                let value = loaded.circuit.output_value(*id).unwrap_or(false);
                println!("{} = {}", name, value as u8);
            }
            if !outcome.converged {
                warn!("circuit did not settle within {} iterations", max_iterations);
            }
        }

        Command::Layout {
            file,
            output,
            width,
            height,
        } => {
            let mut loaded = load(&file)?;
            let placement = layout::arrange(&mut loaded.circuit, &LayoutConfig::with_canvas(width, height));
            info!("{} column(s)", placement.columns);
            design::save_file(&loaded.circuit, &output)?;
        }
    }

    Ok(())
}
