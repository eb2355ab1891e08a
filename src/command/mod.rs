/// Command tree: flags, positional arguments, callbacks, and subcommands.
///
/// A command moves through two steps. [`Command::parse`] consumes named
/// flags, then positional arguments, then selects a child by name and
/// parses it recursively. [`Command::run`] invokes the callback and, if it
/// succeeds, the selected child's run.
pub mod settings;
mod usage;

pub use settings::{ErrorHandling, Settings, Sink};

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::io::Write;

use tracing::{debug, trace};

use crate::arguments::Arguments;
use crate::bind::{Binder, Handler};
use crate::errors::Error;
use crate::flags::FlagSet;

/// A plain run function: `(command name, extra tokens) -> remaining tokens`.
pub type CommandFunc = Box<dyn FnMut(&str, &[String]) -> Result<Vec<String>, Error>>;

enum Callback {
    Func(CommandFunc),
    Bound(Binder),
}

/// A configuration option, applied in order when a command is built.
pub enum Opt {
    /// Inline usage text shown after the command name.
    Usage(String),
    /// Longer description shown in the parent's command list.
    Description(String),
    /// Plain run function.
    Callback(CommandFunc),
    /// Bound function whose parameters become positional arguments.
    Handler(Binder),
    /// Output sink for usage and error text.
    Output(Sink),
    /// Failure policy.
    ErrorHandling(ErrorHandling),
}

impl Opt {
    /// Set the inline usage text.
    #[must_use]
    pub fn usage(text: impl Into<String>) -> Self {
        Self::Usage(text.into())
    }

    /// Set the description.
    #[must_use]
    pub fn description(text: impl Into<String>) -> Self {
        Self::Description(text.into())
    }

    /// Set a plain run function.
    #[must_use]
    pub fn callback(
        func: impl FnMut(&str, &[String]) -> Result<Vec<String>, Error> + 'static,
    ) -> Self {
        Self::Callback(Box::new(func))
    }

    /// Bind a function; its parameters are parsed as positional arguments.
    #[must_use]
    pub fn handler<H, P>(handler: H, descriptions: &[&str]) -> Self
    where
        H: Handler<P>,
    {
        Self::Handler(Binder::new(handler, descriptions))
    }

    /// Set the output sink.
    #[must_use]
    pub fn output(sink: Sink) -> Self {
        Self::Output(sink)
    }

    /// Set the failure policy.
    #[must_use]
    pub fn error_handling(policy: ErrorHandling) -> Self {
        Self::ErrorHandling(policy)
    }
}

impl fmt::Debug for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(text) => f.debug_tuple("Usage").field(text).finish(),
            Self::Description(text) => f.debug_tuple("Description").field(text).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
            Self::Handler(binder) => f.debug_tuple("Handler").field(binder).finish(),
            Self::Output(_) => f.write_str("Output(..)"),
            Self::ErrorHandling(policy) => f.debug_tuple("ErrorHandling").field(policy).finish(),
        }
    }
}

/// One node of a command tree.
pub struct Command {
    name: String,
    usage: String,
    description: String,
    callback: Option<Callback>,
    extra: Vec<String>,
    selected: Option<String>,
    children: BTreeMap<String, Command>,
    settings: Settings,
    /// Named flags, parsed before positional arguments.
    pub flags: FlagSet,
    /// Positional arguments, parsed before the child selector.
    pub arguments: Arguments,
}

impl Command {
    /// Build a root command with default settings.
    #[must_use]
    pub fn new(name: impl Into<String>, options: impl IntoIterator<Item = Opt>) -> Self {
        Self::with_settings(name, Settings::default(), options)
    }

    /// Build a command starting from `settings`, then apply `options`.
    #[must_use]
    pub fn with_settings(
        name: impl Into<String>,
        settings: Settings,
        options: impl IntoIterator<Item = Opt>,
    ) -> Self {
        let mut cmd = Self {
            name: name.into(),
            usage: String::new(),
            description: String::new(),
            callback: None,
            extra: Vec::new(),
            selected: None,
            children: BTreeMap::new(),
            settings,
            flags: FlagSet::new(),
            arguments: Arguments::new(),
        };
        for option in options {
            cmd.apply(option);
        }
        cmd
    }

    fn apply(&mut self, option: Opt) {
        match option {
            Opt::Usage(text) => self.usage = text,
            Opt::Description(text) => self.description = text,
            Opt::Callback(func) => self.callback = Some(Callback::Func(func)),
            Opt::Handler(binder) => self.callback = Some(Callback::Bound(binder)),
            Opt::Output(sink) => self.settings.output = sink,
            Opt::ErrorHandling(policy) => self.settings.error_handling = policy,
        }
    }

    /// Attach a child that inherits this command's settings, then applies
    /// its own options. A child with the same name is replaced.
    pub fn sub_command(
        &mut self,
        name: impl Into<String>,
        options: impl IntoIterator<Item = Opt>,
    ) -> &mut Command {
        let name = name.into();
        let child = Self::with_settings(name.clone(), self.settings.clone(), options);
        match self.children.entry(name) {
            Entry::Occupied(mut entry) => {
                entry.insert(child);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(child),
        }
    }

    /// Command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inherited settings after options.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Look up a direct child.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Command> {
        self.children.get(name)
    }

    /// Look up a direct child for configuration.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Command> {
        self.children.get_mut(name)
    }

    /// The child chosen by the last parse.
    #[must_use]
    pub fn selected(&self) -> Option<&Command> {
        self.selected.as_deref().and_then(|name| self.children.get(name))
    }

    /// Extra positional tokens left after the last parse (leaf commands).
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.extra
    }

    /// Parse `tokens` into flags, arguments, and a selected child.
    ///
    /// # Errors
    ///
    /// Flag, argument, or binder failures; `RequiredCommand` when children
    /// exist but no selector is left; `UnknownCommand` when the selector
    /// matches no child. The error is surfaced through the policy.
    ///
    /// # Panics
    ///
    /// Under [`ErrorHandling::Panic`], on any failure.
    pub fn parse(&mut self, tokens: &[String]) -> Result<(), Error> {
        let result = self.parse_tokens(tokens);
        self.handle(result)
    }

    fn parse_tokens(&mut self, tokens: &[String]) -> Result<(), Error> {
        debug!(command = %self.name, tokens = tokens.len(), "parsing command");
        self.selected = None;
        self.extra.clear();

        let mut rest = self.flags.parse(tokens)?;
        if !self.arguments.is_empty() {
            self.arguments.parse(&rest)?;
            rest = self.arguments.args().to_vec();
        }
        if let Some(Callback::Bound(binder)) = &mut self.callback {
            rest = binder.parse(&rest)?;
        }

        if self.children.is_empty() {
            trace!(command = %self.name, extra = rest.len(), "leaf command parsed");
            self.extra = rest;
            return Ok(());
        }

        let Some((selector, tail)) = rest.split_first() else {
            return Err(Error::RequiredCommand);
        };
        let child = self
            .children
            .get_mut(selector)
            .ok_or_else(|| Error::UnknownCommand(selector.clone()))?;
        debug!(command = %self.name, child = %selector, "selected subcommand");
        child.parse(tail)?;
        self.selected = Some(selector.clone());
        Ok(())
    }

    /// Run the callback, then the selected child.
    ///
    /// Returns the tokens left unconsumed by the last callback that ran.
    ///
    /// # Errors
    ///
    /// `NoCommandFunc` when there is neither a callback nor a selected
    /// child; otherwise the first callback error, which stops the walk.
    ///
    /// # Panics
    ///
    /// Under [`ErrorHandling::Panic`], on any failure.
    pub fn run(&mut self) -> Result<Vec<String>, Error> {
        let result = self.run_selected();
        self.handle(result)
    }

    fn run_selected(&mut self) -> Result<Vec<String>, Error> {
        let child = match &self.selected {
            Some(name) => self.children.get_mut(name),
            None => None,
        };
        debug!(command = %self.name, child = child.is_some(), "running command");

        let mut rest = self.extra.clone();
        match &mut self.callback {
            Some(Callback::Func(func)) => rest = func(&self.name, &self.extra)?,
            Some(Callback::Bound(binder)) => binder.invoke()?,
            None if child.is_none() => return Err(Error::NoCommandFunc(self.name.clone())),
            None => {}
        }

        match child {
            Some(child) => child.run(),
            None => Ok(rest),
        }
    }

    /// Parse `tokens`, then run.
    ///
    /// # Errors
    ///
    /// See [`Command::parse`] and [`Command::run`].
    pub fn execute(&mut self, tokens: &[String]) -> Result<Vec<String>, Error> {
        self.parse(tokens)?;
        self.run()
    }

    /// Write this command's usage to its output sink.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn usage(&self) -> Result<(), Error> {
        let mut out = self.settings.output.clone();
        self.write_usage(&mut out)?;
        Ok(())
    }

    fn handle<T>(&self, result: Result<T, Error>) -> Result<T, Error> {
        let err = match result {
            Ok(value) => return Ok(value),
            // Already reported by a descendant.
            Err(err @ Error::Terminated(_)) => return Err(err),
            Err(err) => err,
        };
        match self.settings.error_handling {
            ErrorHandling::Report => Err(err),
            ErrorHandling::Terminate => {
                debug!(command = %self.name, %err, "terminating");
                let mut out = self.settings.output.clone();
                // Sink failures are dropped so the original error reaches the host.
                let _ = writeln!(out, "{err}");
                if err.is_usage() {
                    let _ = self.write_usage(&mut out);
                }
                let _ = out.flush();
                Err(Error::Terminated(Box::new(err)))
            }
            ErrorHandling::Panic => panic!("{err}"),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("description", &self.description)
            .field("error_handling", &self.settings.error_handling)
            .field("flags", &self.flags)
            .field("arguments", &self.arguments)
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    use super::*;
    use crate::value::Binding;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn report() -> Opt {
        Opt::error_handling(ErrorHandling::Report)
    }

    #[test]
    fn test_options_applied_in_order() {
        let cmd = Command::new(
            "app",
            [
                Opt::usage("first"),
                Opt::usage("useless usage"),
                Opt::description("useless description"),
                Opt::error_handling(ErrorHandling::Panic),
            ],
        );
        assert_eq!(cmd.usage, "useless usage");
        assert_eq!(cmd.description, "useless description");
        assert_eq!(cmd.settings().error_handling, ErrorHandling::Panic);
        assert!(cmd.callback.is_none());
    }

    #[test]
    fn test_children_inherit_then_override() {
        let buf = SharedBuf::default();
        let mut root = Command::new("root", [report(), Opt::output(Sink::new(buf.clone()))]);
        root.sub_command("inherits", []);
        root.sub_command("overrides", [Opt::error_handling(ErrorHandling::Panic)]);

        let inherits = root.child("inherits").unwrap();
        assert_eq!(inherits.settings().error_handling, ErrorHandling::Report);
        let overrides = root.child("overrides").unwrap();
        assert_eq!(overrides.settings().error_handling, ErrorHandling::Panic);

        root.child("inherits").unwrap().usage().unwrap();
        assert_eq!(buf.text(), "Usage: inherits\n");

        let flag = Binding::new(false);
        root.child_mut("inherits").unwrap().flags.var(flag.clone(), "v", "");
        root.parse(&tokens(&["inherits", "-v"])).unwrap();
        assert!(flag.get());
    }

    #[test]
    fn test_parse_selects_child() {
        let first = Binding::new(String::from("first"));
        let mut cmd = Command::new("test", [report()]);
        cmd.arguments.var(first.clone(), "");

        cmd.parse(&tokens(&["second"])).unwrap();
        assert_eq!(first.get(), "second");

        let second = Binding::new(String::from("third"));
        cmd.sub_command("foo", []).arguments.var(second.clone(), "");
        cmd.sub_command("bar", []);

        assert!(matches!(
            cmd.parse(&tokens(&["second"])),
            Err(Error::RequiredCommand)
        ));
        assert!(matches!(
            cmd.parse(&tokens(&["second", "baz"])),
            Err(Error::UnknownCommand(name)) if name == "baz"
        ));
        assert!(cmd.selected().is_none());

        cmd.parse(&tokens(&["fourth", "foo", "fifth"])).unwrap();
        assert_eq!(first.get(), "fourth");
        assert_eq!(second.get(), "fifth");
        assert_eq!(cmd.selected().map(Command::name), Some("foo"));
    }

    #[test]
    fn test_child_parse_error_propagates() {
        let mut cmd = Command::new("root", [report()]);
        cmd.sub_command("num", []).arguments.var(Binding::new(0_i64), "<n>");
        assert!(matches!(
            cmd.parse(&tokens(&["num", "x"])),
            Err(Error::Parse)
        ));
        assert!(matches!(
            cmd.parse(&tokens(&["num"])),
            Err(Error::NotEnoughArguments { .. })
        ));
    }

    #[test]
    fn test_flags_before_arguments() {
        let verbose = Binding::new(false);
        let name = Binding::new(String::new());
        let mut cmd = Command::new("greet", [report()]);
        cmd.flags.var(verbose.clone(), "v", "verbose");
        cmd.arguments.var(name.clone(), "<name>");

        cmd.parse(&tokens(&["-v", "ada", "extra"])).unwrap();
        assert!(verbose.get());
        assert_eq!(name.get(), "ada");
        assert_eq!(cmd.args(), tokens(&["extra"]).as_slice());
    }

    #[test]
    fn test_run_results() {
        let run_err = || Err::<Vec<String>, _>(Error::Other(anyhow::anyhow!("Run Error!")));

        let mut cmd = Command::new("no func", [report()]);
        cmd.parse(&[]).unwrap();
        assert!(matches!(cmd.run(), Err(Error::NoCommandFunc(name)) if name == "no func"));

        let mut cmd = Command::new("run error", [report(), Opt::callback(move |_, _| run_err())]);
        cmd.parse(&[]).unwrap();
        assert_eq!(cmd.run().unwrap_err().to_string(), "Run Error!");

        let mut cmd = Command::new("sub command no func", [report()]);
        cmd.sub_command("foo", []);
        cmd.parse(&tokens(&["foo"])).unwrap();
        assert!(matches!(cmd.run(), Err(Error::NoCommandFunc(name)) if name == "foo"));

        let mut cmd = Command::new(
            "callback subcommand no func",
            [report(), Opt::callback(|_, extra| Ok(extra.to_vec()))],
        );
        cmd.sub_command("foo", []);
        cmd.parse(&tokens(&["foo"])).unwrap();
        assert!(matches!(cmd.run(), Err(Error::NoCommandFunc(name)) if name == "foo"));
    }

    #[test]
    fn test_callback_error_skips_child() {
        let child_ran = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&child_ran);
        let mut cmd = Command::new(
            "root",
            [
                report(),
                Opt::callback(|_, _| Err(Error::Other(anyhow::anyhow!("stop")))),
            ],
        );
        cmd.sub_command(
            "child",
            [Opt::callback(move |_, extra| {
                *flag.borrow_mut() = true;
                Ok(extra.to_vec())
            })],
        );
        cmd.parse(&tokens(&["child"])).unwrap();
        assert_eq!(cmd.run().unwrap_err().to_string(), "stop");
        assert!(!*child_ran.borrow());
    }

    #[test]
    fn test_run_order_and_leftovers() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let (root_log, child_log) = (Rc::clone(&order), Rc::clone(&order));
        let mut cmd = Command::new(
            "root",
            [
                report(),
                Opt::callback(move |name, extra| {
                    root_log.borrow_mut().push(name.to_owned());
                    Ok(extra.to_vec())
                }),
            ],
        );
        cmd.sub_command(
            "child",
            [Opt::callback(move |name, extra| {
                child_log.borrow_mut().push(name.to_owned());
                Ok(extra[1..].to_vec())
            })],
        );

        let rest = cmd.execute(&tokens(&["child", "a", "b"])).unwrap();
        assert_eq!(rest, tokens(&["b"]));
        assert_eq!(*order.borrow(), ["root", "child"]);
    }

    #[test]
    fn test_handler_with_children() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (root_seen, child_seen) = (Rc::clone(&seen), Rc::clone(&seen));
        let mut cmd = Command::new(
            "calc",
            [
                report(),
                Opt::handler(
                    move |scale: i64| root_seen.borrow_mut().push(scale),
                    &["<scale>"],
                ),
            ],
        );
        cmd.sub_command(
            "sum",
            [Opt::handler(
                move |n: Vec<i64>| child_seen.borrow_mut().push(n.iter().sum()),
                &["<n>..."],
            )],
        );

        cmd.execute(&tokens(&["10", "sum", "1", "2", "3"])).unwrap();
        assert_eq!(*seen.borrow(), [10, 6]);
    }

    #[test]
    fn test_latched_bind_error_surfaces_at_parse() {
        let mut cmd = Command::new(
            "bad",
            [report(), Opt::handler(|_n: Vec<i64>, _m: u64| {}, &[])],
        );
        assert!(matches!(
            cmd.execute(&tokens(&["1", "2"])),
            Err(Error::Bind(_))
        ));
    }

    #[test]
    fn test_terminate_prints_error_and_usage() {
        let buf = SharedBuf::default();
        let mut cmd = Command::new("app", [Opt::output(Sink::new(buf.clone()))]);
        cmd.sub_command("foo", []);

        let err = cmd.parse(&tokens(&["nope"])).unwrap_err();
        assert!(matches!(&err, Error::Terminated(inner) if matches!(**inner, Error::UnknownCommand(_))));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            buf.text(),
            "invalid usage: unknown command 'nope'\n\
             Usage: app <command> [command options]\nCommands:\nfoo\n\n"
        );
    }

    #[test]
    fn test_terminate_on_run_errors() {
        let buf = SharedBuf::default();
        let mut cmd = Command::new("app", [Opt::output(Sink::new(buf.clone()))]);
        cmd.parse(&[]).unwrap();
        let err = cmd.run().unwrap_err();
        assert!(matches!(&err, Error::Terminated(inner) if matches!(**inner, Error::NoCommandFunc(_))));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            buf.text(),
            "invalid usage: no callback function was provided for 'app'\nUsage: app\n"
        );

        let buf = SharedBuf::default();
        let mut cmd = Command::new(
            "app",
            [
                Opt::output(Sink::new(buf.clone())),
                Opt::callback(|_, _| Err(Error::Other(anyhow::anyhow!("disk full")))),
            ],
        );
        cmd.parse(&[]).unwrap();
        assert!(matches!(cmd.run(), Err(Error::Terminated(_))));
        assert_eq!(buf.text(), "disk full\n");
    }

    #[test]
    fn test_terminate_non_usage_error_skips_usage() {
        let buf = SharedBuf::default();
        let mut cmd = Command::new("app", [Opt::output(Sink::new(buf.clone()))]);
        cmd.arguments.var(Binding::new(0_u64), "<n>");
        let err = cmd.parse(&tokens(&["x"])).unwrap_err();
        assert!(matches!(err, Error::Terminated(_)));
        assert_eq!(buf.text(), "parse error\n");
    }

    #[test]
    fn test_terminated_child_not_reported_twice() {
        let buf = SharedBuf::default();
        let mut cmd = Command::new("app", [Opt::output(Sink::new(buf.clone()))]);
        cmd.sub_command("leaf", []).arguments.var(Binding::new(0_u64), "<n>");
        let err = cmd.parse(&tokens(&["leaf", "x"])).unwrap_err();
        assert!(matches!(err, Error::Terminated(_)));
        assert_eq!(buf.text(), "parse error\n");
    }

    #[test]
    #[should_panic(expected = "invalid usage: a command is required")]
    fn test_panic_policy() {
        let mut cmd = Command::new("app", [Opt::error_handling(ErrorHandling::Panic)]);
        cmd.sub_command("foo", []);
        let _ = cmd.parse(&[]);
    }
}
