//! Sample scripts bundled with the CLI.
//!
//! Each one exercises a different part of the harness contract: argument
//! shapes, return-value normalization, log capture, and failure reporting.

use std::thread;

use anyhow::{Result, anyhow, bail};
use serde_json::{Value, json};

use crate::core::arguments::Arguments;
use crate::script::{FnScript, Module, Script};

type LoadFn = fn(&mut Module) -> Result<()>;

static SUM: FnScript<LoadFn> = sample("sum", "main(args) adds `a` and `b`", load_sum);
static TYPES: FnScript<LoadFn> = sample(
    "types",
    "main(args) returns a value of the requested `type`",
    load_types,
);
static PARAMS: FnScript<LoadFn> = sample(
    "params",
    "main(args) reports direct and nested parameter access",
    load_params,
);
static LOG_LEVELS: FnScript<LoadFn> = sample(
    "log_levels",
    "handler(args) logs at every severity",
    load_log_levels,
);
static DONE: FnScript<LoadFn> = sample(
    "done",
    "handler() takes no input and returns \"done\"",
    load_done,
);
static FAILING: FnScript<LoadFn> = sample(
    "failing",
    "handler prints a line and then fails with `bad`",
    load_failing,
);
static WORKER: FnScript<LoadFn> = sample(
    "worker",
    "main(args) logs from `jobs` spawned threads",
    load_worker,
);
static PANICKING: FnScript<LoadFn> = sample("panicking", "handler panics", load_panicking);
static SILENT: FnScript<LoadFn> = sample(
    "silent",
    "prints at top level but defines no entry point",
    load_silent,
);

const fn sample(name: &'static str, summary: &'static str, load: LoadFn) -> FnScript<LoadFn> {
    FnScript::new(name, summary, load)
}

/// All bundled scripts, in listing order.
pub fn catalog() -> [&'static dyn Script; 9] {
    [
        &SUM, &TYPES, &PARAMS, &LOG_LEVELS, &WORKER, &DONE, &FAILING, &PANICKING, &SILENT,
    ]
}

pub fn find(name: &str) -> Option<&'static dyn Script> {
    catalog().into_iter().find(|script| script.name() == name)
}

fn load_sum(module: &mut Module) -> Result<()> {
    module.print("sum script loaded");
    let out = module.console();
    module.main(move |args: &Arguments| {
        let a = number_arg(args, "a")?;
        let b = number_arg(args, "b")?;
        out.print(format_args!("computing {a} + {b}"));
        Ok(json!({ "sum": a + b }))
    });
    Ok(())
}

fn number_arg(args: &Arguments, key: &str) -> Result<i64> {
    match args.get(key) {
        None => Ok(0),
        Some(value) => match value.as_i64() {
            Some(number) => Ok(number),
            None => bail!("argument {key:?} must be an integer, got {value}"),
        },
    }
}

fn load_types(module: &mut Module) -> Result<()> {
    let out = module.console();
    module.main(move |args: &Arguments| {
        let kind = args.get("type").and_then(Value::as_str).unwrap_or("string");
        out.print(format_args!("returning a {kind}"));
        let value = match kind {
            "string" => json!("a string"),
            "number" => json!(12345),
            "float" => json!(1.5),
            "boolean" => json!(true),
            "null" => Value::Null,
            "list" => json!([1, 2, 3, "four", true]),
            "dict" => json!({
                "name": "test user",
                "age": 30,
                "is_active": true,
                "tags": ["rust", "json"],
            }),
            other => json!(format!("unknown type {other}")),
        };
        Ok(value)
    });
    Ok(())
}

fn load_params(module: &mut Module) -> Result<()> {
    module.main(|args: &Arguments| {
        let direct = args.get("input").cloned().unwrap_or(json!("direct_default"));
        let nested = args.param("input").cloned().unwrap_or(json!("nested_default"));
        Ok(json!({
            "direct_access": direct,
            "nested_access": nested,
            "args_structure": args,
        }))
    });
    Ok(())
}

fn load_log_levels(module: &mut Module) -> Result<()> {
    tracing::info!("log_levels script loaded");
    module.handler(|args: &Arguments| {
        tracing::info!(keys = args.as_map().len(), "received arguments");
        tracing::trace!("trace record");
        tracing::debug!("debug record");
        tracing::info!("info record");
        tracing::warn!("warn record");
        tracing::error!("error record");
        Ok(json!({ "message": "logging finished", "log_count": 5 }))
    });
    Ok(())
}

fn load_worker(module: &mut Module) -> Result<()> {
    module.main(|args: &Arguments| {
        let jobs = number_arg(args, "jobs")?.max(1);
        let handles: Vec<_> = (0..jobs)
            .map(|job| {
                thread::spawn(move || {
                    tracing::info!(job, "worker finished");
                    job * 2
                })
            })
            .collect();
        let mut total = 0;
        for handle in handles {
            total += handle
                .join()
                .map_err(|_| anyhow!("worker thread panicked"))?;
        }
        Ok(json!({ "jobs": jobs, "total": total }))
    });
    Ok(())
}

fn load_done(module: &mut Module) -> Result<()> {
    module.nullary_handler(|| Ok("done"));
    Ok(())
}

fn load_failing(module: &mut Module) -> Result<()> {
    let out = module.console();
    module.nullary_handler(move || -> Result<Value> {
        out.print("about to fail");
        bail!("bad")
    });
    Ok(())
}

fn load_panicking(module: &mut Module) -> Result<()> {
    module.nullary_handler(|| -> Result<Value> { panic!("handler panicked") });
    Ok(())
}

fn load_silent(module: &mut Module) -> Result<()> {
    module.print("nothing to run here");
    Ok(())
}
