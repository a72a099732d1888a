// Trellis demo suite: a small test program built on TestHarness.
// Usage: cargo run --bin trellis-demo -- [--junit-xml-report FILE] [--filter TEXT] ...

use clap::Parser;
use log::info;
use std::cell::RefCell;
use std::fs;
use std::rc::Rc;
use trellis::leak::CountingAllocator;
use trellis::{
    FilesTeardownAction, FnSetupAction, HarnessConfig, Test, TestCase, TestError, TestHarness,
    TestNode, TestSequence,
};

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator;

#[derive(Debug, Parser)]
#[command(name = "trellis-demo", version, about = "Run the trellis demo suite")]
struct DemoArgs {
    #[command(flatten)]
    harness: HarnessConfig,

    /// Also run tests that fail, panic, leak or never report an outcome.
    #[arg(long)]
    with_failures: bool,
}

fn arithmetic() -> TestSequence {
    let mut sequence = TestSequence::new("arithmetic");
    sequence.append(TestCase::new("addition", |test| {
        trellis::fail_if_neq!(test, 2 + 2, 4);
        trellis::pass!(test);
    }));
    sequence.append(TestCase::new("checked division", |test| {
        trellis::abort_if_not!(test, 7i32.checked_div(0).is_none());
        trellis::fail_if_neq!(test, 7i32.checked_div(2), Some(3));
        trellis::pass!(test);
    }));
    sequence
}

fn files() -> TestSequence {
    let mut sequence = TestSequence::new("files");
    sequence.append(TestCase::new("output round trip", |test| {
        let path = match test.context().output_path("demo-round-trip.txt") {
            Ok(path) => path,
            Err(e) => trellis::abort!(test, "{}", e),
        };
        if let Err(e) = fs::write(&path, "trellis") {
            trellis::abort!(test, "cannot write {}: {}", path.display(), e);
        }
        let read = fs::read_to_string(&path).unwrap_or_default();
        trellis::fail_if_neq!(test, read.as_str(), "trellis");
        trellis::pass!(test);
    }));

    // Directories are only final once the harness applied its config, so
    // the paths are looked up during setup.
    let cleanup = Rc::new(RefCell::new(FilesTeardownAction::new()));
    let registered = Rc::clone(&cleanup);
    if let Some(case) = sequence.child_mut(0) {
        case.add_setup_action(Box::new(FnSetupAction(move |test: &Test| -> Result<(), TestError> {
            let dir = test.context().output_directory()?;
            fs::create_dir_all(dir).map_err(|e| TestError::io(dir, e))?;
            registered
                .borrow_mut()
                .add(test.context().output_path("demo-round-trip.txt")?);
            Ok(())
        })));
        case.add_teardown_action(Box::new(cleanup));
    }
    sequence
}

#[cfg(unix)]
fn processes() -> TestSequence {
    use trellis::{ProcessAction, ProcessMode};

    let mut sequence = TestSequence::new("processes");
    let mut background = TestCase::new("background sleeper", |test| trellis::pass!(test));
    background.add_action(ProcessAction::new("sleep 30", ProcessMode::Terminate));
    sequence.append(background);

    let mut finishing = TestCase::new("short command", |test| trellis::pass!(test));
    finishing.add_action(ProcessAction::new("true", ProcessMode::WaitForExit));
    sequence.append(finishing);
    sequence
}

fn deliberate_failures() -> TestSequence {
    let mut sequence = TestSequence::new("deliberate failures");
    sequence.append(TestCase::new("failed check", |test| {
        trellis::fail_if_neq!(test, "left", "right");
        trellis::pass!(test);
    }));
    sequence.append(TestCase::new("panic", |_test| {
        let values: Vec<u32> = Vec::new();
        let _ = values[3];
    }));
    sequence.append(TestCase::new("leak", |test| {
        let leaked: &'static mut [u8] = Box::leak(vec![0u8; 64].into_boxed_slice());
        leaked[0] = 1;
        trellis::pass!(test);
    }));
    sequence.append(TestCase::new("no verdict", |_test| {}));
    sequence
}

fn run(args: DemoArgs) -> Result<i32, TestError> {
    let config = args.harness.load()?;
    let mut harness = TestHarness::with_config("trellis demo", config);

    harness.append(arithmetic());
    harness.append(files());
    #[cfg(unix)]
    harness.append(processes());
    if args.with_failures {
        harness.append(deliberate_failures());
    }

    let summary = harness.run()?;
    info!("demo finished: {}", summary.result);
    Ok(summary.exit_code())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = DemoArgs::parse();
    let code = match run(args) {
        Ok(code) => code,
        Err(e) => {
            let report = miette::Report::new(e);
            eprintln!("{report:?}");
            2
        }
    };
    std::process::exit(code);
}
