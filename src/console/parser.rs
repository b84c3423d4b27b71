// Text command parsing

use std::str::FromStr;

use crate::synth::SynthKind;

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Play,
    Stop,
    Record,
    Tempo(f64),
    AddNote {
        number: u8,
        start: u64,
        length: Option<u64>,
        velocity: Option<u8>,
    },
    /// Index as shown by `ls notes`
    RemoveNote(usize),
    ListNotes,
    ListAudioDevices,
    ListMidiDevices,
    OpenMidi(String),
    Synth(SynthKind),
    Ratios(Vec<f64>),
    Envelope {
        attack: f32,
        decay: f32,
        sustain: f32,
        release: f32,
    },
    /// `None` turns looping off
    Loop(Option<u64>),
    Generate,
    Clear,
    Volume(f32),
    Undo,
    Redo,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("'{0}' is not a valid command, enter 'help' to see what's possible")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid {name} '{value}'")]
    InvalidArgument { name: &'static str, value: String },
}

/// (usage, description) for every command, in help order
pub const HELP: &[(&str, &str)] = &[
    ("play", "start playback (alias: start)"),
    ("stop", "stop playback"),
    ("record", "start playback with MIDI input recording"),
    ("tempo <bpm>", "set the sequencer tempo"),
    ("note <number> <start> [length] [velocity]", "add a note, positions in ticks"),
    ("rm <index>", "remove the note listed at <index> by 'ls notes'"),
    ("ls notes|audio|midi", "list notes, audio outputs or MIDI inputs"),
    ("midi <name>", "open a MIDI input device (alias: open midi <name>)"),
    ("synth fm|rm", "switch the track synthesizer"),
    ("ratios <r...>", "set the modulator frequency ratios"),
    ("envelope <a> <d> <s> <r>", "set the ADSR envelope, times in seconds (alias: adsr)"),
    ("loop <bars>|off", "loop the first bars or disable looping"),
    ("generate", "replace the melody with a generated one (alias: g)"),
    ("clear", "remove every note"),
    ("volume <0..1>", "set the master volume"),
    ("undo", "undo the last edit"),
    ("redo", "redo the last undone edit"),
    ("help", "show this list"),
    ("quit", "exit (alias: exit)"),
];

/// Parse one console line. Keywords are case-insensitive, arguments are whitespace separated.
pub fn parse(line: &str) -> Result<ConsoleCommand, ParseError> {
    let mut words = line.split_whitespace();
    let Some(keyword) = words.next() else {
        return Err(ParseError::Empty);
    };
    let args: Vec<&str> = words.collect();

    let command = match keyword.to_lowercase().as_str() {
        "play" | "start" => no_args(&args, "play", ConsoleCommand::Play)?,
        "stop" => no_args(&args, "stop", ConsoleCommand::Stop)?,
        "record" => no_args(&args, "record", ConsoleCommand::Record)?,
        "tempo" => match args.as_slice() {
            [bpm] => ConsoleCommand::Tempo(number("tempo", bpm)?),
            _ => return Err(ParseError::Usage("tempo <bpm>")),
        },
        "note" => parse_note(&args)?,
        "rm" => match args.as_slice() {
            [index] => ConsoleCommand::RemoveNote(number("note index", index)?),
            _ => return Err(ParseError::Usage("rm <index>")),
        },
        "ls" => parse_list(&args)?,
        "midi" => parse_midi_name(&args)?,
        "open" => match args.split_first() {
            Some((first, rest)) if first.eq_ignore_ascii_case("midi") => parse_midi_name(rest)?,
            _ => return Err(ParseError::Usage("open midi <name>")),
        },
        "synth" => match args.as_slice() {
            [kind] => ConsoleCommand::Synth(SynthKind::from_str(kind).map_err(|_| {
                ParseError::InvalidArgument {
                    name: "synth",
                    value: kind.to_string(),
                }
            })?),
            _ => return Err(ParseError::Usage("synth fm|rm")),
        },
        "ratios" => {
            if args.is_empty() {
                return Err(ParseError::Usage("ratios <r...>"));
            }
            ConsoleCommand::Ratios(
                args.iter()
                    .map(|arg| number("ratio", arg))
                    .collect::<Result<_, _>>()?,
            )
        }
        "envelope" | "adsr" => match args.as_slice() {
            [a, d, s, r] => ConsoleCommand::Envelope {
                attack: number("attack", a)?,
                decay: number("decay", d)?,
                sustain: number("sustain", s)?,
                release: number("release", r)?,
            },
            _ => return Err(ParseError::Usage("envelope <a> <d> <s> <r>")),
        },
        "loop" => match args.as_slice() {
            [off] if off.eq_ignore_ascii_case("off") => ConsoleCommand::Loop(None),
            [bars] => ConsoleCommand::Loop(Some(number("bar count", bars)?)),
            _ => return Err(ParseError::Usage("loop <bars>|off")),
        },
        "generate" | "g" => no_args(&args, "generate", ConsoleCommand::Generate)?,
        "clear" => no_args(&args, "clear", ConsoleCommand::Clear)?,
        "volume" => match args.as_slice() {
            [volume] => ConsoleCommand::Volume(number("volume", volume)?),
            _ => return Err(ParseError::Usage("volume <0..1>")),
        },
        "undo" => no_args(&args, "undo", ConsoleCommand::Undo)?,
        "redo" => no_args(&args, "redo", ConsoleCommand::Redo)?,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        _ => return Err(ParseError::UnknownCommand(line.trim().to_string())),
    };

    Ok(command)
}

fn no_args(
    args: &[&str],
    usage: &'static str,
    command: ConsoleCommand,
) -> Result<ConsoleCommand, ParseError> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(ParseError::Usage(usage))
    }
}

fn number<T: FromStr>(name: &'static str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidArgument {
        name,
        value: value.to_string(),
    })
}

fn parse_note(args: &[&str]) -> Result<ConsoleCommand, ParseError> {
    const USAGE: &str = "note <number> <start> [length] [velocity]";

    let (number_arg, start_arg, rest) = match args {
        [n, s, rest @ ..] if rest.len() <= 2 => (n, s, rest),
        _ => return Err(ParseError::Usage(USAGE)),
    };

    Ok(ConsoleCommand::AddNote {
        number: number("note number", number_arg)?,
        start: number("start tick", start_arg)?,
        length: rest.first().map(|l| number("length", l)).transpose()?,
        velocity: rest.get(1).map(|v| number("velocity", v)).transpose()?,
    })
}

fn parse_list(args: &[&str]) -> Result<ConsoleCommand, ParseError> {
    // "ls audio devices" is accepted too
    let target = match args {
        [target] | [target, "devices"] => target.to_lowercase(),
        _ => return Err(ParseError::Usage("ls notes|audio|midi")),
    };
    match target.as_str() {
        "notes" => Ok(ConsoleCommand::ListNotes),
        "audio" => Ok(ConsoleCommand::ListAudioDevices),
        "midi" => Ok(ConsoleCommand::ListMidiDevices),
        _ => Err(ParseError::Usage("ls notes|audio|midi")),
    }
}

fn parse_midi_name(args: &[&str]) -> Result<ConsoleCommand, ParseError> {
    if args.is_empty() {
        return Err(ParseError::Usage("midi <name>"));
    }
    // Port names contain spaces
    Ok(ConsoleCommand::OpenMidi(args.join(" ")))
}
