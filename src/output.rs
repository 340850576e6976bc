use owo_colors::OwoColorize;

/// Small wrapper around stdout/stderr printing to provide consistent, colored
/// user-facing messages. Colors are enabled only when the stream is a TTY.
#[derive(Clone, Copy)]
enum Stream {
    Out,
    Err,
}

fn is_tty(stream: Stream) -> bool {
    match stream {
        Stream::Out => atty::is(atty::Stream::Stdout),
        Stream::Err => atty::is(atty::Stream::Stderr),
    }
}

fn emit(stream: Stream, label: &str, colored: String, msg: &str) {
    let line = if is_tty(stream) {
        format!("{colored} {msg}")
    } else {
        format!("{label} {msg}")
    };
    match stream {
        Stream::Out => println!("{line}"),
        Stream::Err => eprintln!("{line}"),
    }
}

pub fn print_info(msg: &str) {
    emit(Stream::Out, "info:", "info:".cyan().bold().to_string(), msg);
}

pub fn print_warn(msg: &str) {
    emit(Stream::Err, "warn:", "warn:".yellow().bold().to_string(), msg);
}

pub fn print_error(msg: &str) {
    emit(Stream::Err, "error:", "error:".red().bold().to_string(), msg);
}

/// Print a plain user-facing line (no prefix). Progress lines such as
/// "staged a_0001.tif -> .renumber-staging.../a_0005.tif" go through here so
/// scripts can parse them.
pub fn print_user(msg: &str) {
    println!("{msg}");
}

/// Print an indented list under a warning/error, one path per line.
pub fn print_list<I, S>(items: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for item in items {
        eprintln!("  {}", item.as_ref());
    }
}
