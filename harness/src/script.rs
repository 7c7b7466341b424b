//! Loaded-code model: scripts register their entry points on a [`Module`].
//!
//! A script's [`Script::load`] stands in for its top-level statements. It runs
//! once while output is intercepted, may print or log, and defines the
//! `handler` and/or `main` callables the dispatcher later resolves by name.

use std::fmt;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::core::arguments::Arguments;
use crate::core::failure::{Failure, Stage};
use crate::io::interceptor::Console;

/// User code the harness runs once.
pub trait Script {
    fn name(&self) -> &str;

    /// One-line description shown by `harness list`.
    fn summary(&self) -> &str {
        ""
    }

    /// Execute top-level statements and define entry points.
    fn load(&self, module: &mut Module) -> Result<()>;
}

/// The two names an entry point can be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryName {
    Handler,
    Main,
}

impl EntryName {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryName::Handler => "handler",
            EntryName::Main => "main",
        }
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type NullaryFn = Box<dyn Fn() -> Result<Value, Failure>>;
type UnaryFn = Box<dyn Fn(&Arguments) -> Result<Value, Failure>>;

/// An entry point with its arity.
///
/// The returned value is converted to JSON as part of the call; a conversion
/// failure is reported as a normalization failure.
pub enum Callable {
    Nullary(NullaryFn),
    Unary(UnaryFn),
}

impl Callable {
    pub fn nullary<F, T>(f: F) -> Self
    where
        F: Fn() -> Result<T> + 'static,
        T: Serialize,
    {
        Callable::Nullary(Box::new(move || into_returned(f())))
    }

    pub fn unary<F, T>(f: F) -> Self
    where
        F: Fn(&Arguments) -> Result<T> + 'static,
        T: Serialize,
    {
        Callable::Unary(Box::new(move |args| into_returned(f(args))))
    }

    pub fn arity(&self) -> usize {
        match self {
            Callable::Nullary(_) => 0,
            Callable::Unary(_) => 1,
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable(arity={})", self.arity())
    }
}

fn into_returned<T: Serialize>(outcome: Result<T>) -> Result<Value, Failure> {
    let returned = outcome.map_err(|err| Failure::from_error(Stage::Execution, err))?;
    serde_json::to_value(returned)
        .context("convert returned value to json")
        .map_err(|err| Failure::from_error(Stage::Normalization, err))
}

/// Registry of definitions produced by loading one script.
#[derive(Debug)]
pub struct Module {
    console: Console,
    handler: Option<Callable>,
    main: Option<Callable>,
}

impl Module {
    pub fn new(console: Console) -> Self {
        Self {
            console,
            handler: None,
            main: None,
        }
    }

    /// Console handle for printing, cloneable into entry-point closures.
    pub fn console(&self) -> Console {
        self.console.clone()
    }

    pub fn print(&self, message: impl fmt::Display) {
        self.console.print(message);
    }

    /// Define (or redefine) the entry point called `name`.
    pub fn define(&mut self, name: EntryName, callable: Callable) {
        let slot = match name {
            EntryName::Handler => &mut self.handler,
            EntryName::Main => &mut self.main,
        };
        *slot = Some(callable);
    }

    /// Define `handler(args)`.
    pub fn handler<F, T>(&mut self, f: F)
    where
        F: Fn(&Arguments) -> Result<T> + 'static,
        T: Serialize,
    {
        self.define(EntryName::Handler, Callable::unary(f));
    }

    /// Define `handler()`, taking no arguments.
    pub fn nullary_handler<F, T>(&mut self, f: F)
    where
        F: Fn() -> Result<T> + 'static,
        T: Serialize,
    {
        self.define(EntryName::Handler, Callable::nullary(f));
    }

    /// Define `main(args)`.
    pub fn main<F, T>(&mut self, f: F)
    where
        F: Fn(&Arguments) -> Result<T> + 'static,
        T: Serialize,
    {
        self.define(EntryName::Main, Callable::unary(f));
    }

    pub fn entry(&self, name: EntryName) -> Option<&Callable> {
        match name {
            EntryName::Handler => self.handler.as_ref(),
            EntryName::Main => self.main.as_ref(),
        }
    }
}

/// A script backed by a plain load function.
pub struct FnScript<F> {
    name: &'static str,
    summary: &'static str,
    load: F,
}

impl<F> FnScript<F>
where
    F: Fn(&mut Module) -> Result<()>,
{
    pub const fn new(name: &'static str, summary: &'static str, load: F) -> Self {
        Self {
            name,
            summary,
            load,
        }
    }
}

impl<F> Script for FnScript<F>
where
    F: Fn(&mut Module) -> Result<()>,
{
    fn name(&self) -> &str {
        self.name
    }

    fn summary(&self) -> &str {
        self.summary
    }

    fn load(&self, module: &mut Module) -> Result<()> {
        (self.load)(module)
    }
}
