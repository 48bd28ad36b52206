mod commands;
mod highlighter;

use clap::Parser;
use commands::{Command, parse_command};
use miette::{IntoDiagnostic, Result};
use qcalc::{
    AddonFailure, Calculator, DirectorySource, RoundingMode, Settings, Symbol, render_error,
};
use qcalc_core::{
    evaluator::builtins,
    number::to_decimal,
    serialization::{deserialize_addon_set, serialize_addon_set},
};
use reedline::{
    DefaultCompleter, DefaultPrompt, DefaultPromptSegment, DescriptionMode, EditCommand, Emacs,
    IdeMenu, KeyCode, KeyModifiers, Keybindings, MenuBuilder, Reedline, ReedlineEvent,
    ReedlineMenu, Signal, default_emacs_keybindings,
};
use std::collections::BTreeSet;
use std::io::BufRead;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// qcalc - An extensible arbitrary-precision calculator
#[derive(Parser, Debug)]
#[command(name = "qcalc")]
#[command(about = "Evaluate arithmetic expressions at arbitrary precision", long_about = None)]
struct Args {
    /// Working precision in bits
    #[arg(long)]
    precision: Option<usize>,

    /// Rounding mode for computed values
    #[arg(long)]
    rounding: Option<RoundingMode>,

    /// Fractional digits shown for results
    #[arg(long)]
    digits: Option<usize>,

    /// Directory holding addons
    #[arg(long)]
    addons_dir: Option<PathBuf>,

    /// Directory holding settings.json
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Start without restoring the enabled addons
    #[arg(long)]
    no_addons: bool,

    /// Expression to evaluate (if not provided, reads from stdin)
    expression: Option<String>,
}

/// Where the CLI keeps its files.
struct Paths {
    settings: PathBuf,
    addons_dir: PathBuf,
    enabled_addons: PathBuf,
}

impl Paths {
    fn new(args: &Args) -> Self {
        let config_dir = args.config_dir.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("qcalc")
        });
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("qcalc");
        Self {
            settings: config_dir.join("settings.json"),
            addons_dir: args
                .addons_dir
                .clone()
                .unwrap_or_else(|| data_dir.join("addons")),
            enabled_addons: data_dir.join("addons.json"),
        }
    }
}

struct Session {
    calc: Calculator<DirectorySource>,
    paths: Paths,
    /// Whether the enabled addon set should be written back on exit.
    persist_addons: bool,
}

impl Session {
    fn new(args: &Args) -> Self {
        let paths = Paths::new(args);
        let mut settings = Settings::load_or_default(&paths.settings);
        if let Some(bits) = args.precision {
            settings.precision_bits = bits;
        }
        if let Some(rounding) = args.rounding {
            settings.rounding = rounding;
        }
        if let Some(digits) = args.digits {
            settings.display_precision = digits;
        }

        let source = DirectorySource::new(&paths.addons_dir)
            .with_max_operations(settings.script_max_operations);
        let mut session = Self {
            calc: Calculator::new(source, settings),
            paths,
            persist_addons: !args.no_addons,
        };
        if session.persist_addons {
            session.restore_addons();
        }
        session
    }

    fn restore_addons(&mut self) {
        let saved = match std::fs::read_to_string(&self.paths.enabled_addons) {
            Ok(text) => match deserialize_addon_set(&text) {
                Ok(saved) => saved,
                Err(e) => {
                    tracing::warn!("ignoring {}: {}", self.paths.enabled_addons.display(), e);
                    return;
                }
            },
            Err(_) => return,
        };
        match self.calc.restore_addons(&saved) {
            Ok(failures) => report_failures(&failures),
            Err(e) => eprintln!("{}", e),
        }
    }

    fn save_addons(&self) -> Result<()> {
        let text = serialize_addon_set(&self.calc.active_addons()).into_diagnostic()?;
        if let Some(dir) = self.paths.enabled_addons.parent() {
            std::fs::create_dir_all(dir).into_diagnostic()?;
        }
        std::fs::write(&self.paths.enabled_addons, text).into_diagnostic()
    }

    fn shutdown(mut self) -> Result<()> {
        if self.persist_addons {
            self.save_addons()?;
        }
        report_failures(&self.calc.shutdown());
        Ok(())
    }

    /// Handles one line of input. Returns `false` when the user asked to
    /// leave.
    fn interpret_input(&mut self, input: &str) -> bool {
        if input.trim().is_empty() {
            return true;
        }
        match parse_command(input) {
            Some(Ok(Command::Quit)) => return false,
            Some(Ok(command)) => self.run_command(command),
            Some(Err(e)) => eprintln!("{}", e),
            None => match self.calc.evaluate_to_string(input) {
                Ok(result) => println!("{}", result),
                Err(e) => render_error(input, &e),
            },
        }
        true
    }

    fn run_command(&mut self, command: Command) {
        match command {
            Command::Help => println!("{}", commands::HELP),
            Command::Quit => {}
            Command::Symbols => self.print_symbols(),
            Command::Define {
                name,
                arguments,
                expression,
            } => {
                let arguments: Vec<&str> = arguments.iter().map(String::as_str).collect();
                if let Err(e) = self.calc.define_function(&name, &arguments, &expression) {
                    eprintln!("{}", e);
                }
            }
            Command::Undefine(name) => {
                if !self.calc.undefine(&name) {
                    eprintln!("no variable or function named '{}'", name);
                }
            }
            Command::Addons => self.print_addons(),
            Command::Enable(id) => {
                let mut requested = self.calc.active_addons();
                requested.insert(id);
                report_failures(&self.calc.set_active_addons(&requested));
            }
            Command::Disable(id) => {
                let mut requested = self.calc.active_addons();
                requested.remove(&id);
                report_failures(&self.calc.set_active_addons(&requested));
            }
            Command::Save(path) => {
                if let Err(e) = self.save_symbols(&path) {
                    eprintln!("{:?}", e);
                }
            }
            Command::Load(path) => match std::fs::read_to_string(&path) {
                Ok(text) => match self.calc.import_symbol_table(&text) {
                    Ok(failures) => report_failures(&failures),
                    Err(e) => eprintln!("{}", e),
                },
                Err(e) => eprintln!("cannot read {}: {}", path.display(), e),
            },
            Command::Precision(bits) => self.update_settings(|s| s.precision_bits = bits),
            Command::Digits(digits) => self.update_settings(|s| s.display_precision = digits),
            Command::Rounding(mode) => self.update_settings(|s| s.rounding = mode),
        }
    }

    fn update_settings(&mut self, change: impl FnOnce(&mut Settings)) {
        let mut settings = self.calc.settings().clone();
        change(&mut settings);
        self.calc.set_settings(settings);
    }

    fn save_symbols(&self, path: &Path) -> Result<()> {
        let text = self.calc.export_symbol_table().into_diagnostic()?;
        std::fs::write(path, text).into_diagnostic()
    }

    fn print_symbols(&self) {
        let rounding = self.calc.settings().display_rounding;
        for (name, symbol) in self.calc.symbols().iter() {
            match symbol {
                Symbol::Variable(named) | Symbol::Constant(named) => {
                    let value = match named.decimals {
                        Some(decimals) => to_decimal(&named.value, decimals, rounding),
                        None => self.calc.format(&named.value),
                    };
                    println!("{:<9} {} = {}", symbol.kind(), name, value);
                }
                Symbol::Function(function) => {
                    println!("{:<9} {}{}", symbol.kind(), name, function);
                }
                Symbol::Script(script) => {
                    println!("{:<9} {} -> {}", symbol.kind(), name, script);
                }
            }
        }
    }

    fn print_addons(&self) {
        let available = match self.calc.available_addons() {
            Ok(available) => available,
            Err(e) => {
                eprintln!("{}", e);
                return;
            }
        };
        if available.is_empty() {
            println!("no addons in {}", self.paths.addons_dir.display());
        }
        let active = self.calc.active_addons();
        for id in available.union(&active) {
            let mark = if active.contains(id) { '*' } else { ' ' };
            println!("{} {}", mark, id);
        }
    }
}

fn report_failures(failures: &[AddonFailure]) {
    for failure in failures {
        eprintln!("{}", failure);
    }
}

fn add_menu_keybindings(keybindings: &mut Keybindings) {
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu("completion_menu".to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );
    keybindings.add_binding(
        KeyModifiers::ALT,
        KeyCode::Enter,
        ReedlineEvent::Edit(vec![EditCommand::InsertNewline]),
    );
}

fn setup_reedline(symbols: impl Iterator<Item = String>) -> (Reedline, DefaultPrompt) {
    let words: BTreeSet<String> = commands::NAMES
        .iter()
        .chain(builtins::FUNCTIONS.iter().map(|(name, _)| name))
        .chain(builtins::CONSTANTS)
        .map(|name| name.to_string())
        .chain(symbols)
        .collect();

    let completer = Box::new({
        let mut completions = DefaultCompleter::with_inclusions(&[':', '_']);
        completions.insert(words.into_iter().collect());
        completions
    });

    // Use the interactive menu to select options from the completer
    let ide_menu = IdeMenu::default()
        .with_name("completion_menu")
        .with_min_completion_width(0)
        .with_max_completion_width(50)
        .with_max_completion_height(u16::MAX)
        .with_padding(0)
        .with_cursor_offset(0)
        .with_description_mode(DescriptionMode::PreferRight)
        .with_min_description_width(0)
        .with_max_description_width(50)
        .with_description_offset(1)
        .with_correct_cursor_pos(false);

    let completion_menu = Box::new(ide_menu);

    let mut keybindings = default_emacs_keybindings();
    add_menu_keybindings(&mut keybindings);

    let edit_mode = Box::new(Emacs::new(keybindings));

    let line_editor = Reedline::create()
        .with_highlighter(Box::new(highlighter::Highlighter))
        .with_completer(completer)
        .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
        .with_edit_mode(edit_mode);

    let prompt = DefaultPrompt::new(DefaultPromptSegment::Empty, DefaultPromptSegment::Empty);

    (line_editor, prompt)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging subscriber
    use tracing_subscriber::{EnvFilter, fmt};

    // Use RUST_LOG environment variable to control log level
    // Default to WARN if not set
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .into_diagnostic()?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut session = Session::new(&args);

    // Check if we have a direct expression argument
    if let Some(expr) = &args.expression {
        session.interpret_input(expr);
        return session.shutdown();
    }

    // Otherwise, check if we're in interactive or pipe mode
    let is_interactive = atty::is(atty::Stream::Stdin);

    if is_interactive {
        // Interactive REPL mode
        let names = session.calc.symbols().names().map(str::to_string).collect::<Vec<_>>();
        let (mut line_editor, prompt) = setup_reedline(names.into_iter());

        println!("qcalc - Type expressions to evaluate, :help for commands (Ctrl+D to exit)");

        loop {
            let sig = match line_editor.read_line(&prompt) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Reedline error: {e}");
                    break;
                }
            };

            match sig {
                Signal::Success(buffer) => {
                    if !session.interpret_input(buffer.as_ref()) {
                        break;
                    }
                }
                Signal::CtrlD | Signal::CtrlC => {
                    println!("\nGoodbye!");
                    break;
                }
            }
        }
    } else {
        // Pipe/stdin mode
        let stdin = std::io::stdin();
        let reader = BufReader::new(stdin.lock());

        for line in reader.lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("Error reading line from stdin: {}", e);
                    break;
                }
            };

            if !session.interpret_input(&line) {
                break;
            }
        }
    }

    session.shutdown()
}
