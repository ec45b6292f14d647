use ahmad::audio::{AudioSink, NullSink, WavSink};
use ahmad::integration::{
    AppConfig, AudioOutput, ChatEngine, ChatEvent, Collaborators, NoticeKind,
};
use ahmad::llm::GeminiClient;
use ahmad::messages::{ChatMessage, MessageId, Sender};
use ahmad::store::{FileStore, KeyValueStore, MemoryStore};
use ahmad::sync::RetryPolicy;
use ahmad::vocab::Category;
use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::Receiver;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const ABOUT: &str = "\
Ahmad is your English vocabulary tutor.
 - Ask about any English word to get its meaning, examples and the Hausa translation.
 - Type /teach for a new word from the current category.
 - Words you learn are kept, and /quiz tests you on them once you know three.";

const HELP: &str = "\
Commands:
  /teach             learn a new word
  /category [name]   show or switch the category
  /quiz              start a quiz on your learned words
  /end               end the quiz and show the score
  /words             list learned words
  /speak [id]        read a message aloud (default: the last reply)
  /stop              stop speaking
  /offline, /online  simulate losing or regaining the connection
  /retry             retry the oldest unsent message
  /clear             clear the conversation and learned words
  /about, /help      show information
  /quit              exit";

#[derive(Parser, Debug)]
#[command(name = "ahmad", version, about = "English vocabulary tutor with Hausa translations")]
struct Cli {
    /// Gemini API key (falls back to API_KEY)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Where chat history and learned words are kept
    #[arg(long, env = "AHMAD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Wait for complete replies instead of streaming them
    #[arg(long)]
    no_stream: bool,

    /// Never synthesize speech
    #[arg(long)]
    mute: bool,

    /// Write speech to WAV files in this directory instead of the speaker
    #[arg(long, conflicts_with = "mute")]
    wav_dir: Option<PathBuf>,

    /// Only speak when asked with /speak
    #[arg(long)]
    no_auto_speak: bool,

    /// Retry failed messages only when the connection comes back
    #[arg(long)]
    reconnect_only: bool,

    /// Starting category
    #[arg(long, default_value = "general")]
    category: Category,
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Say(String),
    Teach,
    Category(Option<String>),
    Quiz,
    EndQuiz,
    Words,
    Speak(Option<i64>),
    Stop,
    Offline,
    Online,
    Retry,
    Clear,
    About,
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Command::Say(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim().to_string()).filter(|a| !a.is_empty())),
        None => (rest, None),
    };
    let command = match name.to_ascii_lowercase().as_str() {
        "teach" => Command::Teach,
        "category" | "cat" => Command::Category(arg),
        "quiz" => Command::Quiz,
        "end" => Command::EndQuiz,
        "words" => Command::Words,
        "speak" => match arg {
            None => Command::Speak(None),
            Some(id) => match id.parse() {
                Ok(id) => Command::Speak(Some(id)),
                Err(_) => Command::Unknown(line.to_string()),
            },
        },
        "stop" => Command::Stop,
        "offline" => Command::Offline,
        "online" => Command::Online,
        "retry" => Command::Retry,
        "clear" => Command::Clear,
        "about" => Command::About,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    };
    Some(command)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the chat on stdout stays readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ahmad=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    info!("Starting Ahmad vocabulary tutor");

    let gemini = Arc::new(GeminiClient::new(config.gemini.clone())?);
    let collaborators = Collaborators {
        completion: gemini.clone(),
        synthesizer: gemini,
        sink: build_sink(&config.audio.output)?,
        store: build_store(config.store.data_dir.as_ref()),
    };

    let engine = ChatEngine::new(config, collaborators);
    let events = engine.subscribe();
    // Detached: it ends with the process
    std::thread::Builder::new()
        .name("ahmad-printer".into())
        .spawn(move || print_events(events))
        .context("Failed to start output thread")?;

    if let Err(e) = engine.set_category(cli.category) {
        warn!("Could not set category: {}", e);
    }
    print_conversation(&engine.snapshot().messages);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(command) = parse_command(&line) else {
            continue;
        };
        if command == Command::Quit {
            break;
        }
        run_command(&engine, command).await;
    }

    engine.shutdown();
    info!("Goodbye");
    Ok(())
}

fn build_config(cli: &Cli) -> Result<AppConfig> {
    let api_key = cli
        .api_key
        .clone()
        .or_else(|| std::env::var("API_KEY").ok())
        .context("No API key: pass --api-key or set GEMINI_API_KEY")?;

    let output = if cli.mute {
        AudioOutput::Muted
    } else if let Some(dir) = &cli.wav_dir {
        AudioOutput::WavDir(dir.clone())
    } else {
        AudioOutput::Speaker
    };

    let mut config = AppConfig::new(api_key)
        .with_streaming(!cli.no_stream)
        .with_auto_speak(!cli.no_auto_speak)
        .with_audio_output(output);
    if let Some(dir) = &cli.data_dir {
        config = config.with_data_dir(dir);
    }
    if cli.reconnect_only {
        config = config.with_retry(RetryPolicy::reconnect_only());
    }
    Ok(config)
}

fn build_sink(output: &AudioOutput) -> Result<Arc<dyn AudioSink>> {
    let sink: Arc<dyn AudioSink> = match output {
        AudioOutput::Muted => Arc::new(NullSink),
        AudioOutput::WavDir(dir) => Arc::new(
            WavSink::new(dir).with_context(|| format!("Cannot write WAV files to {:?}", dir))?,
        ),
        AudioOutput::Speaker => speaker_sink(),
    };
    Ok(sink)
}

#[cfg(feature = "audio-io")]
fn speaker_sink() -> Arc<dyn AudioSink> {
    match ahmad::audio::CpalSink::new() {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            warn!("No audio output ({}), replies will not be spoken", e);
            Arc::new(NullSink)
        }
    }
}

#[cfg(not(feature = "audio-io"))]
fn speaker_sink() -> Arc<dyn AudioSink> {
    warn!("Built without audio output, replies will not be spoken");
    Arc::new(NullSink)
}

fn build_store(data_dir: Option<&PathBuf>) -> Arc<dyn KeyValueStore> {
    match data_dir.map(FileStore::new) {
        Some(Ok(store)) => {
            info!("Keeping chat history in {:?}", store.dir());
            Arc::new(store)
        }
        Some(Err(e)) => {
            warn!("{}; history will not survive a restart", e);
            Arc::new(MemoryStore::new())
        }
        None => {
            warn!("No data directory; history will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    }
}

async fn run_command(engine: &ChatEngine, command: Command) {
    match command {
        Command::Say(text) => {
            engine.send(&text);
        }
        Command::Teach => {
            engine.teach_me();
        }
        Command::Category(None) => {
            let current = engine.snapshot().category;
            let names: Vec<_> = Category::ALL.iter().map(|c| c.label()).collect();
            println!("Category: {} (available: {})", current, names.join(", "));
        }
        Command::Category(Some(name)) => {
            let result = name
                .parse::<Category>()
                .and_then(|category| engine.set_category(category));
            if let Err(e) = result {
                println!("! {}", e.user_message());
            }
        }
        Command::Quiz => {
            engine.start_quiz();
        }
        Command::EndQuiz => engine.end_quiz(true),
        Command::Words => {
            let words = engine.snapshot().words;
            if words.is_empty() {
                println!("No words learned yet. Try /teach");
            }
            for word in words.iter() {
                println!("  {} → {}", word.source_term, word.target_translation);
            }
        }
        Command::Speak(id) => {
            let id = id.map(MessageId).or_else(|| last_bot_message(engine));
            match id {
                Some(id) => {
                    // Failures arrive as notices
                    let _ = engine.toggle_speech(id).await;
                }
                None => println!("Nothing to read yet"),
            }
        }
        Command::Stop => engine.stop_audio(),
        Command::Offline => engine.set_online(false),
        Command::Online => engine.set_online(true),
        Command::Retry => engine.retry(),
        Command::Clear => engine.reset(),
        Command::About => println!("{ABOUT}"),
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
        Command::Unknown(line) => println!("Unknown command: {line} (try /help)"),
    }
}

fn last_bot_message(engine: &ChatEngine) -> Option<MessageId> {
    engine
        .snapshot()
        .messages
        .iter()
        .rev()
        .find(|m| m.sender == Sender::Bot)
        .map(|m| m.id)
}

fn print_conversation(messages: &[ChatMessage]) {
    for message in messages {
        match message.sender {
            Sender::Bot => println!("Ahmad [{}]: {}", message.id, message.text),
            Sender::User if message.is_pending() => {
                println!("You [{}] (unsent): {}", message.id, message.text)
            }
            Sender::User => println!("You [{}]: {}", message.id, message.text),
        }
    }
}

/// Renders engine events; streamed replies are printed as they grow
fn print_events(events: Receiver<ChatEvent>) {
    let mut shown: HashMap<MessageId, String> = HashMap::new();
    let mut open_line: Option<MessageId> = None;
    let mut stdout = std::io::stdout();

    for event in events.iter() {
        if let ChatEvent::MessageUpdated { id, .. } = &event {
            if open_line != Some(*id) {
                close_line(&mut open_line);
            }
        } else {
            close_line(&mut open_line);
        }

        match event {
            ChatEvent::MessageAdded(message) if message.sender == Sender::Bot => {
                if message.text.is_empty() {
                    print!("Ahmad [{}]: ", message.id);
                    open_line = Some(message.id);
                } else {
                    println!("Ahmad [{}]: {}", message.id, message.text);
                }
                shown.insert(message.id, message.text);
            }
            ChatEvent::MessageAdded(_) => {}
            ChatEvent::MessageUpdated { id, text } => {
                let previous = shown.entry(id).or_default();
                match text.strip_prefix(previous.as_str()) {
                    Some(delta) if open_line == Some(id) => print!("{delta}"),
                    _ => println!("Ahmad [{}] (updated): {}", id, text),
                }
                *previous = text;
            }
            ChatEvent::MessageConfirmed(_) => {}
            ChatEvent::MessageRemoved(id) => {
                shown.remove(&id);
                println!("(reply {} discarded)", id);
            }
            ChatEvent::ConversationCleared(welcome) => {
                shown.clear();
                println!("--- conversation cleared ---");
                println!("Ahmad [{}]: {}", welcome.id, welcome.text);
            }
            ChatEvent::WordLearned(word) => {
                println!("+ learned: {} → {}", word.source_term, word.target_translation)
            }
            ChatEvent::CategoryChanged(category) => println!("Category: {category}"),
            ChatEvent::QuizStarted => println!("--- quiz started (/end to stop) ---"),
            ChatEvent::QuizEnded => println!("--- quiz ended ---"),
            ChatEvent::AudioStatusChanged(_) => {}
            ChatEvent::ConnectivityChanged { online } => {
                println!("({})", if online { "online" } else { "offline" })
            }
            ChatEvent::Notice { kind, text } => match kind {
                NoticeKind::Info => println!("{text}"),
                NoticeKind::Connection | NoticeKind::Speech => println!("! {text}"),
            },
        }
        let _ = stdout.flush();
    }
}

fn close_line(open_line: &mut Option<MessageId>) {
    if open_line.take().is_some() {
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_sent() {
        assert_eq!(
            parse_command("  what is serendipity? "),
            Some(Command::Say("what is serendipity?".into()))
        );
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn test_slash_commands() {
        assert_eq!(parse_command("/teach"), Some(Command::Teach));
        assert_eq!(parse_command("/QUIZ"), Some(Command::Quiz));
        assert_eq!(
            parse_command("/category food & dining"),
            Some(Command::Category(Some("food & dining".into())))
        );
        assert_eq!(parse_command("/category"), Some(Command::Category(None)));
        assert_eq!(parse_command("/speak 42"), Some(Command::Speak(Some(42))));
        assert_eq!(parse_command("/speak"), Some(Command::Speak(None)));
        assert_eq!(parse_command("/quit"), Some(Command::Quit));
    }

    #[test]
    fn test_bad_commands_are_reported() {
        assert!(matches!(parse_command("/speak soon"), Some(Command::Unknown(_))));
        assert!(matches!(parse_command("/dance"), Some(Command::Unknown(_))));
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "ahmad",
            "--api-key",
            "k",
            "--no-stream",
            "--wav-dir",
            "/tmp/out",
            "--category",
            "travel",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.gemini.api_key, "k");
        assert!(!config.stream.enabled);
        assert_eq!(config.audio.output, AudioOutput::WavDir("/tmp/out".into()));
        assert_eq!(cli.category, Category::Travel);
    }
}
