use ecp5_mini::blinky::{self, TOP};
use ecp5_mini::config::ToolchainConfig;
use ecp5_mini::platform::{self, PlatformDescription};
use ecp5_mini::products::LocalBuildProducts;
use ecp5_mini::{BoardError, Ecp5MiniPlatform, Platform};
use std::env;
use std::path::{Path, PathBuf};

fn usage(program: &str) -> ! {
    eprintln!(
        "Usage: {program} <command> [args]\n\
         \n\
         Commands:\n\
           describe                                  print the board descriptor as JSON\n\
           check                                     validate the board descriptor\n\
           blinky <build-dir> [--config <file>] [--run] [--program]\n\
                                                     prepare (and optionally build and flash) Blinky\n\
           program <products-dir> <name> [--config <file>]\n\
                                                     flash <name>.bit with dfu-util\n\
         \n\
         Environment:\n\
           DFU_UTIL   flashing tool (default: dfu-util)\n\
           RUST_LOG   log filter, e.g. info"
    );
    std::process::exit(2)
}

struct Options {
    positional: Vec<String>,
    config: Option<PathBuf>,
    run: bool,
    program: bool,
}

fn parse_options(program: &str, args: Vec<String>) -> Options {
    let mut options = Options {
        positional: Vec::new(),
        config: None,
        run: false,
        program: false,
    };
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().unwrap_or_else(|| usage(program));
                options.config = Some(PathBuf::from(path));
            }
            "--run" => options.run = true,
            "--program" => options.program = true,
            flag if flag.starts_with("--") => {
                eprintln!("Unknown option: {flag}");
                usage(program)
            }
            _ => options.positional.push(arg),
        }
    }
    options
}

fn load_config(path: Option<&Path>) -> Result<ToolchainConfig, BoardError> {
    match path {
        Some(path) => ToolchainConfig::from_file(path),
        None => Ok(ToolchainConfig::default()),
    }
}

fn main() {
    env_logger::init();

    let mut args: Vec<String> = env::args().collect();
    let program = if args.is_empty() {
        "ecp5_mini".to_string()
    } else {
        args.remove(0)
    };
    if args.is_empty() {
        usage(&program);
    }
    let command = args.remove(0);
    let options = parse_options(&program, args);

    let board = Ecp5MiniPlatform::new();
    let result = match (command.as_str(), options.positional.as_slice()) {
        ("describe", []) => describe(&board),
        ("check", []) => check(&board),
        ("blinky", [build_dir]) => run_blinky(&board, Path::new(build_dir), &options),
        ("program", [products_dir, name]) => {
            program_board(&board, Path::new(products_dir), name, &options)
        }
        _ => usage(&program),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn describe(board: &Ecp5MiniPlatform) -> Result<(), BoardError> {
    let json = serde_json::to_string_pretty(&PlatformDescription::of(board))
        .map_err(|e| BoardError::Config(format!("failed to serialize descriptor: {e}")))?;
    println!("{json}");
    Ok(())
}

fn check(board: &Ecp5MiniPlatform) -> Result<(), BoardError> {
    platform::validate(board)?;
    let id = board.identity();
    let exclusive = board.resources().iter().filter(|r| r.is_exclusive()).count();
    println!(
        "{} {} speed {}: {} resources ({} exclusive), {} connector pins, default clock {}",
        id.device,
        id.package,
        id.speed,
        board.resources().len(),
        exclusive,
        board.connectors().iter().map(|c| c.len()).sum::<usize>(),
        id.default_clk
    );
    Ok(())
}

fn run_blinky(
    board: &Ecp5MiniPlatform,
    build_dir: &Path,
    options: &Options,
) -> Result<(), BoardError> {
    let config = load_config(options.config.as_deref())?;
    platform::validate(board)?;

    let fragment = blinky::blinky(board)?;
    let plan = board.toolchain_prepare(&fragment, TOP, &config.prepare)?;
    if options.run {
        plan.run(build_dir)?;
    } else {
        plan.write_to(build_dir)?;
        println!("wrote {} to {}", plan.script_name(), build_dir.display());
    }

    if options.program {
        config
            .programmer()
            .program(&LocalBuildProducts::new(build_dir), TOP)?;
        println!("programmed {TOP}.bit");
    }
    Ok(())
}

fn program_board(
    board: &Ecp5MiniPlatform,
    products_dir: &Path,
    name: &str,
    options: &Options,
) -> Result<(), BoardError> {
    let products = LocalBuildProducts::new(products_dir);
    match &options.config {
        Some(path) => ToolchainConfig::from_file(path)?.programmer().program(&products, name)?,
        None => board.toolchain_program(&products, name)?,
    }
    println!("programmed {name}.bit");
    Ok(())
}
