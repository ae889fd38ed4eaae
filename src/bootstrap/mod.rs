//! The ordered setup procedure: validate prerequisites, sync submodules,
//! then hand off to the project-file generator.

pub mod plan;

use std::io::{self, Write};

pub use plan::{Overrides, SetupPlan, Variant};

use crate::utils::process::{Invocation, ProcessRunner};
use crate::validators::{GeneratorValidator, GraphicsSdkValidator, RuntimeValidator, ValidationError};

pub struct Collaborators<'a> {
    pub runtime: &'a dyn RuntimeValidator,
    pub generator: &'a dyn GeneratorValidator,
    pub graphics: &'a dyn GraphicsSdkValidator,
    pub runner: &'a dyn ProcessRunner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    /// The generator is available. `generated` is false when the host OS
    /// is not the supported one and generation was skipped.
    Completed { generated: bool },
    GeneratorMissing,
}

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Runtime(#[from] ValidationError),
    #[error("writing setup output: {0}")]
    Output(#[from] io::Error),
}

pub fn submodule_sync(plan: &SetupPlan) -> Invocation {
    Invocation::new(
        "git",
        ["submodule", "update", "--init", "--recursive"]
            .map(String::from)
            .to_vec(),
        &plan.root,
    )
}

pub fn generator_call(plan: &SetupPlan) -> Invocation {
    Invocation::new(plan.generator_path(), vec![plan.target.clone()], &plan.root)
}

/// Run the whole procedure once. Only a runtime validation failure stops it early.
pub fn run(
    plan: &SetupPlan,
    tools: &Collaborators<'_>,
    host_os: &str,
    out: &mut dyn Write,
) -> Result<SetupOutcome, SetupError> {
    let runtime = tools.runtime.validate()?;
    log::debug!(
        "runtime ok: {} ({})",
        runtime.interpreter,
        runtime.version
    );
    log::info!("project root: {}", plan.root.display());

    let generator_available = tools.generator.ensure_available(&plan.root);

    match tools.graphics.validate(&plan.root) {
        Ok(sdk) => log::debug!("graphics sdk ok: {} at {}", sdk.version, sdk.path.display()),
        Err(e) => log::warn!("{e}"),
    }

    if plan.sync_submodules {
        writeln!(out, "\nUpdating submodules...")?;
        run_best_effort(tools.runner, &submodule_sync(plan));
    }

    if !generator_available {
        writeln!(
            out,
            "{} requires Premake to generate project files.",
            plan.project_name
        )?;
        return Ok(SetupOutcome::GeneratorMissing);
    }

    let generated = if host_os == plan.supported_os {
        writeln!(out, "\nRunning premake...")?;
        run_best_effort(tools.runner, &generator_call(plan));
        true
    } else {
        log::warn!(
            "project files are only generated on {}; skipped on {host_os}",
            plan.supported_os
        );
        false
    };

    writeln!(out, "\nSetup completed!")?;
    Ok(SetupOutcome::Completed { generated })
}

/// External step whose failure is reported but never stops setup.
fn run_best_effort(runner: &dyn ProcessRunner, invocation: &Invocation) {
    match runner.run(invocation) {
        Ok(outcome) if outcome.is_success() => {}
        Ok(outcome) => log::warn!(
            "`{}` finished with {}; continuing",
            invocation.render(),
            outcome.describe()
        ),
        Err(e) => log::warn!("{e:#}; continuing"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::process::ProcessOutcome;
    use crate::validators::{RuntimeReport, SdkReport};
    use proptest::prelude::*;
    use std::cell::{Cell, RefCell};
    use std::path::{Path, PathBuf};

    struct FakeRuntime {
        fail: bool,
        calls: Cell<usize>,
    }

    impl RuntimeValidator for FakeRuntime {
        fn validate(&self) -> Result<RuntimeReport, ValidationError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(ValidationError::Missing {
                    tool: "Python".to_string(),
                    hint: "install it".to_string(),
                });
            }
            Ok(RuntimeReport {
                interpreter: "python3".to_string(),
                version: "3.12.1".to_string(),
            })
        }
    }

    struct FakeGenerator {
        available: bool,
        roots: RefCell<Vec<PathBuf>>,
    }

    impl GeneratorValidator for FakeGenerator {
        fn ensure_available(&self, root: &Path) -> bool {
            self.roots.borrow_mut().push(root.to_path_buf());
            self.available
        }
    }

    struct FakeGraphics {
        fail: bool,
        calls: Cell<usize>,
    }

    impl GraphicsSdkValidator for FakeGraphics {
        fn validate(&self, root: &Path) -> Result<SdkReport, ValidationError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(ValidationError::Missing {
                    tool: "Vulkan SDK".to_string(),
                    hint: String::new(),
                });
            }
            Ok(SdkReport {
                path: root.join("VulkanSDK"),
                version: "1.3.216.0".to_string(),
            })
        }
    }

    /// Records every invocation; `fail` makes each one exit non-zero.
    #[derive(Default)]
    struct RecordingRunner {
        calls: RefCell<Vec<Invocation>>,
        fail: bool,
    }

    impl ProcessRunner for RecordingRunner {
        fn run(&self, invocation: &Invocation) -> anyhow::Result<ProcessOutcome> {
            self.calls.borrow_mut().push(invocation.clone());
            if self.fail {
                anyhow::bail!("spawn failed");
            }
            Ok(ProcessOutcome::success())
        }
    }

    struct Harness {
        runtime: FakeRuntime,
        generator: FakeGenerator,
        graphics: FakeGraphics,
        runner: RecordingRunner,
    }

    impl Harness {
        fn new(generator_available: bool) -> Self {
            Self {
                runtime: FakeRuntime {
                    fail: false,
                    calls: Cell::new(0),
                },
                generator: FakeGenerator {
                    available: generator_available,
                    roots: RefCell::new(Vec::new()),
                },
                graphics: FakeGraphics {
                    fail: false,
                    calls: Cell::new(0),
                },
                runner: RecordingRunner::default(),
            }
        }

        fn run(&self, plan: &SetupPlan, os: &str) -> (Result<SetupOutcome, SetupError>, String) {
            let tools = Collaborators {
                runtime: &self.runtime,
                generator: &self.generator,
                graphics: &self.graphics,
                runner: &self.runner,
            };
            let mut out = Vec::new();
            let result = run(plan, &tools, os, &mut out);
            (result, String::from_utf8(out).expect("utf8 output"))
        }

        fn generator_calls(&self, plan: &SetupPlan) -> Vec<Invocation> {
            let program = plan.generator_path();
            self.runner
                .calls
                .borrow()
                .iter()
                .filter(|c| c.program == program)
                .cloned()
                .collect()
        }

        fn sync_calls(&self) -> usize {
            self.runner
                .calls
                .borrow()
                .iter()
                .filter(|c| c.program == Path::new("git"))
                .count()
        }
    }

    fn plan(variant: Variant) -> SetupPlan {
        SetupPlan::resolve(
            PathBuf::from("/work/Hazel"),
            &Default::default(),
            &Overrides {
                variant: Some(variant),
                ..Overrides::default()
            },
        )
    }

    #[test]
    fn windows_with_generator_runs_premake_once() {
        let h = Harness::new(true);
        let plan = plan(Variant::Current);
        let (result, out) = h.run(&plan, "windows");

        assert_eq!(result.expect("ok"), SetupOutcome::Completed { generated: true });
        let calls = h.generator_calls(&plan);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args, vec!["vs2022".to_string()]);
        assert!(out.contains("Running premake..."));
        assert!(out.ends_with("Setup completed!\n"));
    }

    #[test]
    fn legacy_variant_targets_vs2019_without_sync() {
        let h = Harness::new(true);
        let plan = plan(Variant::Legacy);
        let (result, out) = h.run(&plan, "windows");

        assert!(result.is_ok());
        assert_eq!(h.generator_calls(&plan)[0].args, vec!["vs2019".to_string()]);
        assert_eq!(h.sync_calls(), 0);
        assert!(!out.contains("Updating submodules"));
    }

    #[test]
    fn linux_with_generator_reports_success_without_generating() {
        let h = Harness::new(true);
        let plan = plan(Variant::Current);
        let (result, out) = h.run(&plan, "linux");

        assert_eq!(result.expect("ok"), SetupOutcome::Completed { generated: false });
        assert!(h.generator_calls(&plan).is_empty());
        assert!(!out.contains("Running premake"));
        assert!(out.contains("Setup completed!"));
    }

    #[test]
    fn missing_generator_prints_requirement() {
        let h = Harness::new(false);
        let plan = plan(Variant::Current);
        let (result, out) = h.run(&plan, "windows");

        assert_eq!(result.expect("ok"), SetupOutcome::GeneratorMissing);
        assert!(h.generator_calls(&plan).is_empty());
        assert!(out.contains("Hazel requires Premake to generate project files."));
        assert!(!out.contains("Setup completed!"));
        assert_eq!(h.sync_calls(), 1);
    }

    #[test]
    fn runtime_failure_stops_before_anything_else() {
        let mut h = Harness::new(true);
        h.runtime.fail = true;
        let plan = plan(Variant::Current);
        let (result, out) = h.run(&plan, "windows");

        let err = result.expect_err("must halt");
        assert!(matches!(err, SetupError::Runtime(ValidationError::Missing { .. })));
        assert!(h.generator.roots.borrow().is_empty());
        assert_eq!(h.graphics.calls.get(), 0);
        assert!(h.runner.calls.borrow().is_empty());
        assert!(out.is_empty());
    }

    #[test]
    fn process_and_graphics_failures_do_not_stop_setup() {
        let mut h = Harness::new(true);
        h.graphics.fail = true;
        h.runner.fail = true;
        let plan = plan(Variant::Current);
        let (result, out) = h.run(&plan, "windows");

        assert_eq!(result.expect("ok"), SetupOutcome::Completed { generated: true });
        assert_eq!(h.runner.calls.borrow().len(), 2);
        assert!(out.contains("Setup completed!"));
    }

    #[test]
    fn every_operation_uses_the_project_root() {
        let h = Harness::new(true);
        let plan = plan(Variant::Current);
        let _ = h.run(&plan, "windows");

        assert_eq!(*h.generator.roots.borrow(), vec![plan.root.clone()]);
        for call in h.runner.calls.borrow().iter() {
            assert_eq!(call.cwd, plan.root);
        }
        assert!(h.generator_calls(&plan)[0].program.starts_with(&plan.root));
    }

    #[test]
    fn sync_runs_before_generation() {
        let h = Harness::new(true);
        let plan = plan(Variant::Current);
        let _ = h.run(&plan, "windows");

        let calls = h.runner.calls.borrow();
        assert_eq!(calls[0].render(), "git submodule update --init --recursive");
        assert_eq!(calls[1].program, plan.generator_path());
    }

    proptest! {
        #[test]
        fn generation_requires_generator_and_supported_os(
            available in any::<bool>(),
            os in prop::sample::select(vec!["windows", "linux", "macos", "freebsd"]),
            legacy in any::<bool>(),
        ) {
            let variant = if legacy { Variant::Legacy } else { Variant::Current };
            let h = Harness::new(available);
            let plan = plan(variant);
            let (result, out) = h.run(&plan, os);
            let outcome = result.expect("runtime is valid");

            let calls = h.generator_calls(&plan);
            if available && os == "windows" {
                prop_assert_eq!(calls.len(), 1);
                prop_assert_eq!(&calls[0].args, &vec![variant.target().to_string()]);
            } else {
                prop_assert!(calls.is_empty());
            }

            prop_assert_eq!(out.contains("Setup completed!"), available);
            prop_assert_eq!(out.contains("requires Premake"), !available);
            prop_assert_eq!(outcome == SetupOutcome::GeneratorMissing, !available);
            prop_assert_eq!(h.sync_calls(), usize::from(variant.sync_submodules()));
        }

        #[test]
        fn repeated_runs_are_identical(
            available in any::<bool>(),
            windows in any::<bool>(),
        ) {
            let os = if windows { "windows" } else { "linux" };
            let plan = plan(Variant::Current);

            let h = Harness::new(available);
            let (r1, out1) = h.run(&plan, os);
            let (r2, out2) = h.run(&plan, os);

            prop_assert_eq!(r1.expect("ok"), r2.expect("ok"));
            prop_assert_eq!(out1, out2);
            let calls = h.runner.calls.borrow();
            let (once, twice) = calls.split_at(calls.len() / 2);
            prop_assert_eq!(once, twice);
        }
    }
}
