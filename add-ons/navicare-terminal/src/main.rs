//! NaviCare terminal: interactive symptom triage against the configured model.
//!
//! Type symptoms at the prompt; slash commands drive everything else (`/help`).
//! Build with `--features device` for microphone input and spoken replies.

use navicare_core::prompts::{EMERGENCY_NUMBER, RED_FLAGS};
use navicare_core::{
    filter_languages, find_language, NavicareConfig, Phase, ProviderDirectory, ReasoningGateway,
    Role, SessionDriver, SessionState, DEFAULT_SPECIALTY,
};
use navicare_voice::{SpeechCapture, SpeechOutput};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
Commands:
  /languages [filter]    list languages
  /lang <name>           choose the conversation language
  /start                 accept the disclaimer and begin
  <text>                 describe your symptoms / answer a question
  /listen                start or stop voice input
  /say <n>               read message n aloud
  /search <zip> [insurance]  find providers for the recommended specialty
  /save <n>              save or unsave provider n from the last search
  /saved                 list saved providers
  /referral              print a referral note for the assessment
  /redflags              symptoms that need emergency care
  /new                   start a new assessment
  /quit                  exit";

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Languages(String),
    Language(String),
    Start,
    Listen,
    Say(usize),
    Search { zip_code: String, insurance: String },
    Save(usize),
    Saved,
    Referral,
    RedFlags,
    New,
    Quit,
    Text(String),
    Invalid(String),
}

/// `n` is 1-based on screen.
fn parse_index(arg: &str, usage: &str) -> Result<usize, String> {
    match arg.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(usage.to_string()),
    }
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Text(line.to_string());
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match name {
        "help" | "?" => Command::Help,
        "languages" => Command::Languages(arg.to_string()),
        "lang" if !arg.is_empty() => Command::Language(arg.to_string()),
        "lang" => Command::Invalid("usage: /lang <name>".into()),
        "start" => Command::Start,
        "listen" => Command::Listen,
        "say" => parse_index(arg, "usage: /say <message number>").map_or_else(Command::Invalid, Command::Say),
        "save" => parse_index(arg, "usage: /save <provider number>").map_or_else(Command::Invalid, Command::Save),
        "search" => {
            let (zip_code, insurance) = match arg.split_once(char::is_whitespace) {
                Some((zip, insurance)) => (zip, insurance.trim()),
                None => (arg, ""),
            };
            Command::Search {
                zip_code: zip_code.to_string(),
                insurance: insurance.to_string(),
            }
        }
        "saved" => Command::Saved,
        "referral" => Command::Referral,
        "redflags" => Command::RedFlags,
        "new" | "reset" => Command::New,
        "quit" | "exit" => Command::Quit,
        other => Command::Invalid(format!("unknown command /{} (try /help)", other)),
    }
}

/// Tracks what has already been printed so each render only shows what changed.
#[derive(Default)]
struct View {
    messages: usize,
    result_shown: bool,
    providers_shown: bool,
    was_listening: bool,
}

impl View {
    fn clear(&mut self) {
        *self = View::default();
    }

    fn render(&mut self, state: &SessionState) {
        if state.messages.len() < self.messages {
            self.messages = 0;
        }
        for (i, message) in state.messages.iter().enumerate().skip(self.messages) {
            let who = match message.role {
                Role::Model => "NaviCare",
                Role::User => "You",
            };
            println!("[{}] {}: {}", i + 1, who, message.text);
        }
        self.messages = state.messages.len();

        if state.listening != self.was_listening {
            println!("{}", if state.listening { "🎙️  listening..." } else { "🎙️  stopped" });
            self.was_listening = state.listening;
        }

        if let (Some(result), false) = (&state.triage, self.result_shown) {
            println!();
            if let Some(notice) = state.emergency_notice() {
                println!("🚨 {}", notice);
            }
            println!("Assessment: {} ({})", result.level, result.level.care_setting());
            if !result.summary.is_empty() {
                println!("Summary: {}", result.summary);
            }
            println!("Specialty: {}", result.specialty().unwrap_or(DEFAULT_SPECIALTY));
            if state.can_search_providers() {
                println!("Find a provider with /search <zip> [insurance]");
            }
            self.result_shown = true;
        }

        if state.searched && !self.providers_shown && !state.is_loading() {
            if state.providers.is_empty() {
                println!("No providers found. Try another ZIP code.");
            }
            for (i, p) in state.providers.iter().enumerate() {
                println!("({}) {} | {} | {} | {}", i + 1, p.name, p.specialty, p.address, p.phone);
                if let Some(url) = p.booking_url.as_deref().or(p.website.as_deref()) {
                    println!("    {}", url);
                }
                if !p.accepted_insurance.is_empty() {
                    println!("    accepts: {}", p.accepted_insurance.join(", "));
                }
            }
            self.providers_shown = true;
        }
    }
}

/// Returns false when the user asked to quit.
async fn handle(driver: &mut SessionDriver, view: &mut View, command: Command) -> bool {
    let outcome = match command {
        Command::Quit => return false,
        Command::Help => {
            println!("{}", HELP);
            Ok(())
        }
        Command::Languages(filter) => {
            for lang in filter_languages(&filter) {
                println!("{} {} ({})", lang.flag, lang.label, lang.code);
            }
            Ok(())
        }
        Command::Language(name) => match find_language(&name) {
            Some(lang) => {
                println!("Language: {} {}", lang.flag, lang.label);
                driver.select_language(lang).await
            }
            None => {
                println!("  ! unknown language {:?} (see /languages)", name);
                Ok(())
            }
        },
        Command::Start => driver.start().await,
        Command::Text(text) => driver.send(&text).await,
        Command::Listen => {
            if !driver.capture_available() {
                println!("  ! voice input unavailable (build with --features device)");
                return true;
            }
            driver.toggle_listening().await
        }
        Command::Say(index) => driver.read_aloud(index).await,
        Command::Search { zip_code, insurance } => {
            let result = async {
                driver.set_search_inputs(&zip_code, &insurance).await?;
                driver.search().await
            }
            .await;
            if result.is_ok() {
                view.providers_shown = false;
                println!("Searching...");
            }
            result
        }
        Command::Save(index) => {
            let provider = match driver.state().provider(index) {
                Ok(p) => p.clone(),
                Err(e) => {
                    println!("  ! {}", e);
                    return true;
                }
            };
            match driver.toggle_saved(&provider) {
                Ok(true) => println!("Saved {}", provider.name),
                Ok(false) => println!("Removed {}", provider.name),
                Err(e) => println!("  ! could not update saved providers: {}", e),
            }
            Ok(())
        }
        Command::Saved => {
            let saved = driver.directory().saved();
            if saved.is_empty() {
                println!("No saved providers.");
            }
            for p in saved {
                println!("* {} | {} | {}", p.name, p.address, p.phone);
            }
            Ok(())
        }
        Command::Referral => {
            match &driver.state().triage {
                Some(result) => print!("{}", result.referral_note()),
                None => println!("No assessment yet."),
            }
            Ok(())
        }
        Command::RedFlags => {
            println!("Call {} for:", EMERGENCY_NUMBER);
            for flag in RED_FLAGS {
                println!("  - {}", flag);
            }
            Ok(())
        }
        Command::New => {
            let result = driver.reset().await;
            view.clear();
            println!("New assessment. /start when ready.");
            result
        }
        Command::Invalid(usage) => {
            println!("  ! {}", usage);
            Ok(())
        }
    };
    if let Err(e) = outcome {
        println!("  ! {}", e);
    }
    true
}

#[cfg(feature = "device")]
fn speech_devices(config: &NavicareConfig) -> (Arc<dyn SpeechCapture>, Arc<dyn SpeechOutput>) {
    use navicare_voice::{create_best_stt, MicrophoneCapture, OpenAiStt, RodioOutput, SttBackend};

    let remote = config.resolved_stt_api_key().and_then(|key| {
        OpenAiStt::new(config.stt_base_url.clone(), key, config.stt_model.clone())
            .map_err(|e| tracing::warn!(error = %e, "STT client unavailable"))
            .ok()
    });
    let stt: Arc<dyn SttBackend> = match remote {
        Some(stt) => Arc::new(stt),
        None => Arc::from(create_best_stt()),
    };
    (
        Arc::new(MicrophoneCapture::new(stt)),
        Arc::new(RodioOutput::new().with_sample_rate(config.sample_rate)),
    )
}

#[cfg(not(feature = "device"))]
fn speech_devices(_config: &NavicareConfig) -> (Arc<dyn SpeechCapture>, Arc<dyn SpeechOutput>) {
    use navicare_voice::{NoCapture, SilentOutput};
    (Arc::new(NoCapture), Arc::new(SilentOutput))
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[navicare] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match NavicareConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[navicare] invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let gateway = match ReasoningGateway::from_config(&config) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("[navicare] {}", e);
            std::process::exit(1);
        }
    };
    let directory = match ProviderDirectory::open_path(config.directory_path()) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("[navicare] cannot open saved providers at {}: {}", config.directory_path().display(), e);
            std::process::exit(1);
        }
    };
    tracing::info!(model = %config.model, saved = directory.saved().len(), "NaviCare ready");

    let (capture, output) = speech_devices(&config);
    let mut driver = SessionDriver::new(gateway, directory, capture, output)
        .with_language(config.language())
        .with_voice(config.voice.clone());

    println!("NaviCare AI: symptom assessment and provider navigation.");
    println!("This is not a medical diagnosis. For a life-threatening emergency call {} now.", EMERGENCY_NUMBER);
    println!("Language: {}. /languages to change, /start to begin, /help for commands.", driver.state().language.label);

    let mut view = View::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => {
                    if !handle(&mut driver, &mut view, parse_command(&line)).await {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin closed");
                    break;
                }
            },
            event = driver.next_event() => driver.dispatch_background(event).await,
        }
        view.render(driver.state());
        if driver.state().phase == Phase::Conversing && driver.state().is_loading() {
            println!("...");
        }
    }

    if let Err(e) = driver.reset().await {
        tracing::warn!(error = %e, "shutdown reset refused");
    }
}
