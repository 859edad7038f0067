use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use xshell::{Shell, cmd};

use crate::runner::BuiltDesign;
use crate::utils::needs_rebuild;
use crate::wrapper::render_testbench;
use crate::{Backend, BuildSpec, Runner, RunnerError, TestReport, TestSpec};

const TRACE_FST: &str = "--trace-fst";
const TRACE_VCD: &str = "--trace";

/// Verilator: the design is verilated on build, the testbench is compiled to a binary on test
#[derive(Debug, Default)]
pub struct VerilatorRunner {
    built: Option<BuiltDesign>,
}

impl VerilatorRunner {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Waveform extension and any tracing flag missing from `build_args`
fn trace_format(build_args: &[String]) -> (&'static str, Option<&'static str>) {
    if build_args.iter().any(|arg| arg == TRACE_FST) {
        ("fst", None)
    } else if build_args.iter().any(|arg| arg == TRACE_VCD) {
        ("vcd", None)
    } else {
        ("vcd", Some(TRACE_VCD))
    }
}

/// Arguments of `verilator` for the `--cc` build or the `--binary` test compile
fn verilator_args(
    mode: &str,
    top: &str,
    mdir: &Path,
    design: &BuiltDesign,
    trace_flag: Option<&str>,
    testbench: Option<&Path>,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        mode.into(),
        "--top-module".into(),
        top.into(),
        "-Mdir".into(),
        mdir.into(),
    ];
    args.extend(design.build_args.iter().map(OsString::from));
    args.extend(trace_flag.map(OsString::from));
    args.extend(testbench.map(OsString::from));
    args.extend(design.sources.iter().map(OsString::from));
    args
}

/// Waveform path for `module` and the tracing flag that has to be added for it
fn waveform_for(
    build_dir: &Path,
    module: &str,
    build_args: &[String],
    waves: bool,
) -> (Option<PathBuf>, Option<&'static str>) {
    if !waves {
        return (None, None);
    }
    let (extension, extra_trace) = trace_format(build_args);
    (Some(build_dir.join(format!("{module}.{extension}"))), extra_trace)
}

impl Runner for VerilatorRunner {
    fn backend_name(&self) -> &str {
        Backend::Verilator.name()
    }

    fn build(&mut self, spec: &BuildSpec<'_>) -> Result<(), RunnerError> {
        let design = BuiltDesign::from_spec(Backend::Verilator, spec)?;

        let toplevel = &design.toplevel;
        let mdir = spec.build_dir.join(toplevel);
        fs::create_dir_all(&mdir)?;
        let stamp = mdir.join("verilator_build.stamp");

        if needs_rebuild(spec.always, &stamp, &design.sources, toplevel)? {
            log::info!("Running Verilator for {}", toplevel);
            let sh = Shell::new()?;
            let args = verilator_args("--cc", toplevel, &mdir, &design, None, None);
            cmd!(sh, "verilator {args...}").run()?;
            fs::write(&stamp, "")?;
        }

        self.built = Some(design);
        Ok(())
    }

    fn test(&mut self, spec: &TestSpec<'_>) -> Result<TestReport, RunnerError> {
        let design = BuiltDesign::require(self.built.as_ref(), spec.hdl_toplevel)?;
        let module = &spec.test_module.name;
        let mdir = spec.build_dir.join(module);
        fs::create_dir_all(&mdir)?;

        let (waveform, trace_flag) =
            waveform_for(spec.build_dir, module, &design.build_args, spec.waves);
        let testbench = spec.build_dir.join(format!("{module}.sv"));
        fs::write(
            &testbench,
            render_testbench(&design.toplevel, spec.test_module, waveform.as_deref()),
        )?;

        log::info!("Running {} on {} with verilator", module, design.toplevel);
        let sh = Shell::new()?;
        let args = verilator_args("--binary", module, &mdir, design, trace_flag, Some(&testbench));

        let mut compile = cmd!(sh, "verilator {args...}");
        compile.set_quiet(!spec.verbose);
        compile.run()?;

        let executable = mdir.join(format!("V{module}"));
        let mut run = sh.cmd(&executable);
        run.set_quiet(!spec.verbose);
        run.run()?;

        Ok(TestReport {
            test_module: module.clone(),
            testbench,
            waveform,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_format_follows_build_args() {
        let fst = vec!["--timing".to_string(), "--trace-fst".to_string()];
        assert_eq!(trace_format(&fst), ("fst", None));

        let vcd = vec!["--trace".to_string()];
        assert_eq!(trace_format(&vcd), ("vcd", None));

        assert_eq!(trace_format(&[]), ("vcd", Some("--trace")));
    }

    const FLAGS: [&str; 7] = [
        "-Wno-TIMESCALEMOD",
        "-Wno-WIDTHTRUNC",
        "--verilate-jobs",
        "-j 10",
        "--trace-fst",
        "--trace-structs",
        "--timing",
    ];

    fn design(build_args: &[&str]) -> BuiltDesign {
        BuiltDesign {
            toplevel: "monit".into(),
            sources: vec![PathBuf::from("proj/monit.v"), PathBuf::from("proj/comUnit.v")],
            build_args: build_args.iter().map(|f| f.to_string()).collect(),
        }
    }

    fn strings(args: &[OsString]) -> Vec<&str> {
        args.iter().map(|arg| arg.to_str().unwrap()).collect()
    }

    #[test]
    fn test_build_command_line() {
        let args = verilator_args(
            "--cc",
            "monit",
            Path::new("sim_build/monit"),
            &design(&FLAGS),
            None,
            None,
        );
        let mut expected = vec!["--cc", "--top-module", "monit", "-Mdir", "sim_build/monit"];
        expected.extend(FLAGS);
        expected.extend(["proj/monit.v", "proj/comUnit.v"]);
        assert_eq!(strings(&args), expected);
    }

    #[test]
    fn test_test_command_line_with_fst() {
        let design = design(&FLAGS);
        let (waveform, trace_flag) =
            waveform_for(Path::new("sim_build"), "testMonit", &design.build_args, true);
        assert_eq!(waveform.as_deref(), Some(Path::new("sim_build/testMonit.fst")));
        assert_eq!(trace_flag, None);

        let args = verilator_args(
            "--binary",
            "testMonit",
            Path::new("sim_build/testMonit"),
            &design,
            trace_flag,
            Some(Path::new("sim_build/testMonit.sv")),
        );
        let args = strings(&args);
        assert_eq!(
            &args[..5],
            ["--binary", "--top-module", "testMonit", "-Mdir", "sim_build/testMonit"]
        );
        assert_eq!(&args[5..12], FLAGS);
        assert_eq!(
            &args[12..],
            ["sim_build/testMonit.sv", "proj/monit.v", "proj/comUnit.v"]
        );
    }

    #[test]
    fn test_test_command_line_adds_vcd_tracing() {
        let design = design(&["--timing"]);
        let (waveform, trace_flag) =
            waveform_for(Path::new("out"), "testCom", &design.build_args, true);
        assert_eq!(waveform.as_deref(), Some(Path::new("out/testCom.vcd")));

        let args = verilator_args(
            "--binary",
            "testCom",
            Path::new("out/testCom"),
            &design,
            trace_flag,
            Some(Path::new("out/testCom.sv")),
        );
        let args = strings(&args);
        assert_eq!(
            &args[5..],
            ["--timing", "--trace", "out/testCom.sv", "proj/monit.v", "proj/comUnit.v"]
        );

        assert_eq!(
            waveform_for(Path::new("out"), "testCom", &design.build_args, false),
            (None, None)
        );
    }
}
