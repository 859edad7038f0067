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

/// Icarus Verilog: `iverilog` to compile, `vvp` to run
#[derive(Debug, Default)]
pub struct IcarusRunner {
    built: Option<BuiltDesign>,
}

impl IcarusRunner {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Arguments of one `iverilog` invocation; the testbench, if any, precedes the design sources
fn iverilog_args(
    output: &Path,
    top: &str,
    design: &BuiltDesign,
    testbench: Option<&Path>,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-g2012".into(),
        "-o".into(),
        output.into(),
        "-s".into(),
        top.into(),
    ];
    args.extend(design.build_args.iter().map(OsString::from));
    args.extend(testbench.map(OsString::from));
    args.extend(design.sources.iter().map(OsString::from));
    args
}

/// Files the test phase writes for `module`: testbench, compiled image and waveform
fn test_outputs(build_dir: &Path, module: &str, waves: bool) -> (PathBuf, PathBuf, Option<PathBuf>) {
    (
        build_dir.join(format!("{module}.sv")),
        build_dir.join(format!("{module}.vvp")),
        waves.then(|| build_dir.join(format!("{module}.vcd"))),
    )
}

impl Runner for IcarusRunner {
    fn backend_name(&self) -> &str {
        Backend::Icarus.name()
    }

    fn build(&mut self, spec: &BuildSpec<'_>) -> Result<(), RunnerError> {
        let design = BuiltDesign::from_spec(Backend::Icarus, spec)?;
        fs::create_dir_all(spec.build_dir)?;

        let toplevel = &design.toplevel;
        let output = spec.build_dir.join(format!("{toplevel}.vvp"));
        let stamp = spec.build_dir.join(format!("{toplevel}.icarus.stamp"));

        if needs_rebuild(spec.always, &stamp, &design.sources, toplevel)? {
            log::info!("Building {} with icarus", toplevel);
            let sh = Shell::new()?;
            let args = iverilog_args(&output, toplevel, &design, None);
            cmd!(sh, "iverilog {args...}").run()?;
            fs::write(&stamp, "")?;
        }

        self.built = Some(design);
        Ok(())
    }

    fn test(&mut self, spec: &TestSpec<'_>) -> Result<TestReport, RunnerError> {
        let design = BuiltDesign::require(self.built.as_ref(), spec.hdl_toplevel)?;
        let module = &spec.test_module.name;

        let (testbench, output, waveform) = test_outputs(spec.build_dir, module, spec.waves);
        fs::write(
            &testbench,
            render_testbench(&design.toplevel, spec.test_module, waveform.as_deref()),
        )?;

        log::info!("Running {} on {} with icarus", module, design.toplevel);
        let sh = Shell::new()?;
        let args = iverilog_args(&output, module, design, Some(&testbench));

        let mut compile = cmd!(sh, "iverilog {args...}");
        compile.set_quiet(!spec.verbose);
        compile.run()?;

        let mut run = cmd!(sh, "vvp -n {output}");
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

    const FLAGS: [&str; 7] = [
        "-Wno-TIMESCALEMOD",
        "-Wno-WIDTHTRUNC",
        "--verilate-jobs",
        "-j 10",
        "--trace-fst",
        "--trace-structs",
        "--timing",
    ];

    fn design() -> BuiltDesign {
        BuiltDesign {
            toplevel: "serialCom".into(),
            sources: vec![
                PathBuf::from("proj/../verilog/uartTx.v"),
                PathBuf::from("proj/../verilog/serialCom.v"),
            ],
            build_args: FLAGS.iter().map(|f| f.to_string()).collect(),
        }
    }

    fn strings(args: &[OsString]) -> Vec<&str> {
        args.iter().map(|arg| arg.to_str().unwrap()).collect()
    }

    #[test]
    fn test_build_command_line() {
        let args = iverilog_args(Path::new("sim_build/serialCom.vvp"), "serialCom", &design(), None);
        let mut expected = vec!["-g2012", "-o", "sim_build/serialCom.vvp", "-s", "serialCom"];
        expected.extend(FLAGS);
        expected.extend(["proj/../verilog/uartTx.v", "proj/../verilog/serialCom.v"]);
        assert_eq!(strings(&args), expected);
    }

    #[test]
    fn test_test_command_line() {
        let (testbench, output, waveform) = test_outputs(Path::new("sim_build"), "testCom", true);
        assert_eq!(testbench, Path::new("sim_build/testCom.sv"));
        assert_eq!(output, Path::new("sim_build/testCom.vvp"));
        assert_eq!(waveform.as_deref(), Some(Path::new("sim_build/testCom.vcd")));

        let args = iverilog_args(&output, "testCom", &design(), Some(&testbench));
        let args = strings(&args);
        assert_eq!(&args[..5], ["-g2012", "-o", "sim_build/testCom.vvp", "-s", "testCom"]);
        assert_eq!(&args[5..12], FLAGS);
        assert_eq!(
            &args[12..],
            ["sim_build/testCom.sv", "proj/../verilog/uartTx.v", "proj/../verilog/serialCom.v"]
        );
    }

    #[test]
    fn test_no_waveform_without_waves() {
        let (_, _, waveform) = test_outputs(Path::new("sim_build"), "testMonit", false);
        assert!(waveform.is_none());
    }
}
