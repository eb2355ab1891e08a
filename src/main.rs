#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! cmdbind demo: a small calculator tree built from bound functions.

use std::time::{Duration, Instant};

use cmdbind::value::duration::format_duration;
use cmdbind::{Binding, Command, Error, ErrorHandling, Opt};
use tracing::debug;

fn build(policy: ErrorHandling) -> Command {
    let mut app = Command::new(
        env!("CARGO_PKG_NAME"),
        [
            Opt::description("bind functions to positional arguments"),
            Opt::error_handling(policy),
        ],
    );

    app.sub_command(
        "add",
        [
            Opt::handler(|a: i64, b: i64| println!("{}", a + b), &["<a>", "<b>"]),
            Opt::description("print the sum of two integers"),
        ],
    );

    app.sub_command(
        "sum",
        [
            Opt::handler(
                |n: Vec<f64>| println!("{}", n.iter().sum::<f64>()),
                &["<n>..."],
            ),
            Opt::description("print the sum of any number of values"),
        ],
    );

    app.sub_command(
        "sleep",
        [
            Opt::handler(
                |wait: Duration| {
                    let started = Instant::now();
                    std::thread::sleep(wait);
                    println!("slept {}", format_duration(started.elapsed()));
                },
                &["<duration>"],
            ),
            Opt::description("sleep for a duration such as 1.5s or 2m"),
        ],
    );

    let shout = Binding::new(false);
    let greeting = shout.clone();
    let greet = app.sub_command(
        "greet",
        [
            Opt::handler(
                move |name: String| -> Result<(), Error> {
                    if name.is_empty() {
                        return Err(anyhow::anyhow!("name must not be empty").into());
                    }
                    let line = format!("hello, {name}");
                    if greeting.get() {
                        println!("{}", line.to_uppercase());
                    } else {
                        println!("{line}");
                    }
                    Ok(())
                },
                &["<name>"],
            ),
            Opt::description("greet someone"),
        ],
    );
    greet.flags.var(shout, "shout", "print the greeting in capitals");

    app
}

fn policy_from_env() -> ErrorHandling {
    match std::env::var("CMDBIND_ERRORS") {
        Ok(text) => text.parse().unwrap_or_else(|err: String| {
            eprintln!("{err}; using {}", ErrorHandling::default());
            ErrorHandling::default()
        }),
        Err(_) => ErrorHandling::default(),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let policy = policy_from_env();
    let tokens: Vec<String> = std::env::args().skip(1).collect();
    debug!(%policy, tokens = tokens.len(), "starting");

    let mut app = build(policy);
    match app.execute(&tokens) {
        Ok(rest) if !rest.is_empty() => {
            eprintln!("ignored extra arguments: {}", rest.join(" "));
        }
        Ok(_) => {}
        Err(err) => {
            if !matches!(err, Error::Terminated(_)) {
                eprintln!("error: {err}");
            }
            std::process::exit(err.exit_code());
        }
    }
}
