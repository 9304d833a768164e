#![deny(rust_2018_compatibility)]
#![deny(rust_2018_idioms)]

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    process::{self, Command},
};

use anyhow::{anyhow, bail, Context};
use chipgen::{
    bind::{self, Handlers},
    cm, codegen, translate, Report, Verified,
};
use log::info;
use structopt::StructOpt;

/// Generates typed register-access code and vector tables for Cortex-M microcontrollers
#[derive(StructOpt)]
#[structopt(name = "chipgen")]
enum Opts {
    /// Generates an accessor crate (`lib.rs`) and a vector table (`vectors.rs`) from an SVD file
    Generate {
        #[structopt(name = "SVD", parse(from_os_str))]
        svd: PathBuf,

        /// Output directory
        #[structopt(long, parse(from_os_str))]
        out: PathBuf,

        /// Binds a vector to a handler, e.g. `UART0=on_uart0`, `SysTick=tick` or `45=on_uart3`
        #[structopt(long = "handler", number_of_values = 1)]
        handlers: Vec<String>,

        /// Symbol of the initial stack pointer
        #[structopt(long)]
        stack_top: Option<String>,

        /// Makes writes to `TYPE.REGISTER` unsafe
        #[structopt(long = "unsafe-write", number_of_values = 1)]
        unsafe_writes: Vec<String>,

        /// Runs `rustfmt` on the generated files
        #[structopt(long)]
        rustfmt: bool,
    },

    /// Generates the API of the Cortex-M core peripherals (SCB, DCB, DWT, NVIC)
    Core {
        #[structopt(long, parse(from_os_str))]
        out: PathBuf,

        #[structopt(long)]
        rustfmt: bool,
    },

    /// Validates an SVD file
    Check {
        #[structopt(name = "SVD", parse(from_os_str))]
        svd: PathBuf,
    },
}

fn main() -> Result<(), anyhow::Error> {
    process::exit(not_main()?)
}

fn not_main() -> Result<i32, anyhow::Error> {
    env_logger::init();

    match Opts::from_args() {
        Opts::Generate {
            svd,
            out,
            handlers,
            stack_top,
            unsafe_writes,
            rustfmt,
        } => {
            let xml = read(&svd)?;
            let parsed = translate::svd::parse(&xml)
                .with_context(|| format!("while parsing {}", svd.display()))?;

            info!("translating {}", parsed.name);
            let mut dev = translate::svd::device(&parsed)?;
            for target in &unsafe_writes {
                let mut parts = target.splitn(2, '.');
                match (parts.next(), parts.next()) {
                    (Some(periph), Some(reg)) => dev.make_write_unsafe(periph, reg)?,
                    _ => bail!("expected TYPE.REGISTER, found `{}`", target),
                }
            }

            let dev = match verified(dev) {
                Ok(dev) => dev,
                Err(code) => return Ok(code),
            };

            let mut bindings = Handlers::new();
            for assignment in &handlers {
                bindings.parse_assignment(assignment)?;
            }
            if let Some(symbol) = stack_top {
                bindings.set_stack_top(symbol);
            }

            info!("binding {} handlers", handlers.len());
            let table = match bind::bind(&dev, &bindings) {
                Ok(table) => table,
                Err(report) => return Ok(failed(&report)),
            };

            create_dir(&out)?;
            emit(&out.join("lib.rs"), codegen::device(&dev), rustfmt)?;
            emit(
                &out.join("vectors.rs"),
                codegen::vectors(&dev, &table),
                rustfmt,
            )?;
        }

        Opts::Core { out, rustfmt } => {
            let dev = match verified(cm::device()) {
                Ok(dev) => dev,
                Err(code) => return Ok(code),
            };

            create_dir(&out)?;
            emit(&out.join("lib.rs"), codegen::device(&dev), rustfmt)?;
        }

        Opts::Check { svd } => {
            let xml = read(&svd)?;
            let parsed = translate::svd::parse(&xml)
                .with_context(|| format!("while parsing {}", svd.display()))?;
            let dev = translate::svd::device(&parsed)?;

            if let Err(code) = verified(dev) {
                return Ok(code);
            }
            println!("{}: OK", svd.display());
        }
    }

    Ok(0)
}

fn read(path: &Path) -> Result<String, anyhow::Error> {
    info!("reading {}", path.display());
    fs::read_to_string(path).with_context(|| format!("while reading {}", path.display()))
}

fn verified(dev: chipgen::ir::Device<'_>) -> Result<Verified<'_>, i32> {
    info!("validating {}", dev.name);
    dev.verify().map_err(|report| failed(&report))
}

fn failed<E>(report: &Report<E>) -> i32
where
    E: fmt::Display,
{
    eprintln!("error: {}", report);
    1
}

fn create_dir(path: &Path) -> Result<(), anyhow::Error> {
    fs::create_dir_all(path).with_context(|| format!("while creating {}", path.display()))
}

fn emit(path: &Path, code: String, rustfmt: bool) -> Result<(), anyhow::Error> {
    fs::write(path, code).with_context(|| format!("while writing {}", path.display()))?;
    info!("wrote {}", path.display());

    if rustfmt
        && !Command::new("rustfmt")
            .arg(path)
            .status()
            .map_err(|e| anyhow!("couldn't run `rustfmt`: {}", e))?
            .success()
    {
        bail!("`rustfmt` failed on {}", path.display());
    }

    Ok(())
}
