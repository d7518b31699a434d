// ukconfig: Kconfig menu browser for unikernel configurations

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser as _;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use ukconfig::dotconfig::DotConfigFile;
use ukconfig::kconfig::{
    HandlerTable, KConfigFile, KeyValue, KeyValueMap, MenuId, MissingMainMenu, ParseOptions,
    Parser, ShellHandler,
};
use ukconfig::ui::App;

#[derive(clap::Parser, Debug)]
#[command(name = "ukconfig")]
#[command(about = "Browse a Kconfig tree and edit its .config")]
struct Args {
    /// Root Kconfig file
    kconfig: PathBuf,

    /// .config to load and save (created on save if missing)
    #[arg(long, default_value = ".config")]
    config: PathBuf,

    /// Value of UK_BASE (default: the directory of the Kconfig file)
    #[arg(long)]
    base: Option<PathBuf>,

    /// Extra preprocessor binding, may be repeated
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    define: Vec<KeyValue>,

    /// Kill $(shell,...) commands running longer than this
    #[arg(long, value_name = "SECS")]
    shell_timeout: Option<u64>,

    /// Accept a Kconfig tree without a mainmenu
    #[arg(long)]
    allow_missing_mainmenu: bool,

    /// Count select/imply targets as dependencies
    #[arg(long)]
    reverse_deps: bool,

    /// Print the option tree and exit
    #[arg(long)]
    dump: bool,
}

fn seed_env(args: &Args) -> KeyValueMap {
    let base = args.base.clone().unwrap_or_else(|| {
        args.kconfig
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });

    let mut env = KeyValueMap::new();
    env.insert("UK_BASE", base.display().to_string());
    env.extend(args.define.iter().cloned());
    env
}

fn dump_tree(kconf: &KConfigFile, id: MenuId, depth: usize) {
    let menu = kconf.menu(id);
    let mut line = format!("{}{}", "  ".repeat(depth), menu.kind.as_str());
    if !menu.name.is_empty() {
        line.push(' ');
        line.push_str(&menu.name);
    }
    if menu.is_config() {
        line.push_str(&format!(" [{}]", menu.ty));
    }
    if let Some(prompt) = &menu.prompt {
        line.push_str(&format!(" \"{}\"", prompt.text));
    }
    let deps = kconf.depends_on(id);
    if !deps.is_empty() {
        let names: Vec<&str> = deps.iter().map(String::as_str).collect();
        line.push_str(&format!(" <- {}", names.join(" ")));
    }
    println!("{}", line);

    for &child in kconf.children(id) {
        dump_tree(kconf, child, depth + 1);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let shell = ShellHandler::new().with_timeout(args.shell_timeout.map(Duration::from_secs));
    let options = ParseOptions {
        missing_mainmenu: if args.allow_missing_mainmenu {
            MissingMainMenu::Empty
        } else {
            MissingMainMenu::Error
        },
        reverse_dependencies: args.reverse_deps,
        ..ParseOptions::default()
    };

    let mut parser = Parser::new(seed_env(&args))
        .with_handlers(HandlerTable::with_shell(shell))
        .with_options(options);

    let kconf = match parser.parse_file(&args.kconfig) {
        Ok(kconf) => kconf,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    log::info!(
        "parsed {}: {} config symbols",
        args.kconfig.display(),
        kconf.configs().len()
    );

    if args.dump {
        dump_tree(&kconf, kconf.root(), 0);
        return Ok(());
    }

    let config = if args.config.exists() {
        DotConfigFile::from_file(&args.config)?
    } else {
        log::info!("{} does not exist, starting empty", args.config.display());
        DotConfigFile::new()
    };

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(kconf, config, args.config);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }
    if app.dirty {
        eprintln!("Unsaved changes to {} discarded", app.config_path.display());
    }

    Ok(())
}
