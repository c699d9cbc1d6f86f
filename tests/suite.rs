// Centralized integration suite for the script harness; exercises loading,
// resolution, execution, and the CLI so changes surface in one place.
mod support;

use anyhow::{Context, Result, anyhow, bail};
use scriptrunner::{
    ConfigError, FileSource, InlineSource, ParamType, ParamValue, Parameters,
    ResolutionError, Resolver, Script, ScriptController, ScriptError, ScriptMetadata,
    ScriptRegistry, UnitTable,
};
use serde_json::{Value, json};
use std::error::Error as _;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Barrier, Mutex, OnceLock};
use support::{addition_record, repo_root, run_command, script_runner, write_config};
use tempfile::TempDir;

fn record(name: &str, module: &str, class: &str) -> Value {
    json!({
        "name": name,
        "module": module,
        "class": class,
        "input_required": false,
        "parameters": {}
    })
}

fn controller_with(records: Vec<Value>, units: UnitTable) -> ScriptController {
    ScriptController::load(&InlineSource::new(records), units).expect("registry loads")
}

const ORDERED_YAML: &str = "\
- name: Zulu
  module: scripts::addition
  class: AdditionScript
  input_required: false
  parameters: {}
- name: Addition
  module: scripts::addition
  class: AdditionScript
  input_required: false
  parameters:
    a:
      type: float
      default: 0.0
      help: First number
    b:
      type: float
      default: 0.0
      help: Second number
- name: Mike
  module: scripts::addition
  class: AdditionScript
  input_required: false
  parameters: {}
";

// Load keeps one descriptor per record in source order, from YAML or JSON.
#[test]
fn load_preserves_source_order() -> Result<()> {
    let temp = TempDir::new()?;
    let records = vec![
        record("Zulu", "scripts::addition", "AdditionScript"),
        addition_record(),
        record("Mike", "scripts::addition", "AdditionScript"),
    ];
    let yaml_path = temp.path().join("scripts.yaml");
    fs::write(&yaml_path, ORDERED_YAML)?;
    let json_path = write_config(temp.path(), "scripts.json", &records)?;

    let from_yaml = ScriptRegistry::load(&FileSource::new(&yaml_path))?;
    let from_json = ScriptRegistry::load(&FileSource::new(&json_path))?;
    for registry in [&from_yaml, &from_json] {
        assert_eq!(registry.names(), vec!["Zulu", "Addition", "Mike"]);
        assert_eq!(registry.descriptors().len(), records.len());
    }
    assert_eq!(from_yaml.descriptors(), from_json.descriptors());
    Ok(())
}

// Dropping any required field anywhere in the source fails the whole load.
#[test]
fn missing_required_field_fails_whole_load() -> Result<()> {
    for field in ["name", "module", "class", "input_required", "parameters"] {
        let mut broken = addition_record();
        broken
            .as_object_mut()
            .context("record is an object")?
            .remove(field);
        let source = InlineSource::new(vec![
            record("First", "scripts::addition", "AdditionScript"),
            broken,
        ]);
        match ScriptRegistry::load(&source) {
            Err(ConfigError::MissingField(missing)) => assert_eq!(missing, field),
            Err(other) => bail!("unexpected error for {field}: {other}"),
            Ok(_) => bail!("load succeeded without {field}"),
        }
    }
    Ok(())
}

// Only int, float, string, and bool are accepted as parameter types.
#[test]
fn unsupported_parameter_type_fails_load() {
    for bad in ["decimal", "list", "Float", ""] {
        let mut raw = addition_record();
        raw["parameters"]["a"]["type"] = json!(bad);
        let err = ScriptRegistry::load(&InlineSource::new(vec![raw])).unwrap_err();
        assert!(
            matches!(err, ConfigError::UnsupportedType { ref name, .. } if name == "a"),
            "{bad}: {err}"
        );
    }
}

#[test]
fn shipped_config_resolves_with_builtin_units() -> Result<()> {
    let path = repo_root().join("config").join("scripts_config.yaml");
    let registry = ScriptRegistry::load(&FileSource::new(&path))?;
    let resolver = Resolver::new(UnitTable::builtin());
    for descriptor in registry.descriptors() {
        resolver
            .resolve(descriptor)
            .map_err(|err| anyhow!("{}: {err}", descriptor.name))?;
    }
    assert!(registry.find("Addition").is_ok());
    Ok(())
}

// Unknown names never fall back to some other descriptor.
#[test]
fn find_nonexistent_is_not_found() {
    let controller = controller_with(vec![addition_record()], UnitTable::builtin());
    let err = controller.get_descriptor("nonexistent").unwrap_err();
    assert_eq!(err.name, "nonexistent");

    let err = controller
        .execute("Missing", None, None, Parameters::new())
        .unwrap_err();
    assert!(matches!(err, ScriptError::NotFound(_)));
    assert!(err.to_string().contains("Missing"));
}

#[test]
fn unresolvable_locator_is_resolution_error() {
    let resolver = Resolver::new(UnitTable::builtin());
    let registry = ScriptRegistry::load(&InlineSource::new(vec![
        record("NoModule", "scripts::vanished", "AdditionScript"),
        record("NoClass", "scripts::addition", "Subtraction"),
    ]))
    .expect("load");

    let err = resolver
        .resolve(registry.find("NoModule").unwrap())
        .err()
        .expect("module missing");
    assert!(matches!(err, ResolutionError::ModuleNotFound { .. }));

    let err = resolver
        .resolve(registry.find("NoClass").unwrap())
        .err()
        .expect("class missing");
    assert!(matches!(err, ResolutionError::ClassNotFound { .. }));
}

// A registered name that is not a Script fails resolution, and the controller
// reports it in the import category with the cause attached.
#[test]
fn non_plugin_type_is_contract_violation() {
    let mut units = UnitTable::builtin();
    units.register_opaque("scripts::addition", "CsvHelper");
    let controller = controller_with(
        vec![record("Helper", "scripts::addition", "CsvHelper")],
        units,
    );

    let err = controller
        .execute("Helper", None, None, Parameters::new())
        .unwrap_err();
    assert_eq!(err.category(), "import");
    assert!(err.to_string().contains("CsvHelper does not satisfy the plugin contract"));
    assert!(matches!(
        err.source().and_then(|s| s.downcast_ref::<ResolutionError>()),
        Some(ResolutionError::ContractViolation { .. })
    ));
}

static COUNTER_RUNS: Mutex<Vec<usize>> = Mutex::new(Vec::new());

#[derive(Default)]
struct CallCounter {
    calls: usize,
}

impl Script for CallCounter {
    fn run(&mut self, _: Option<&Path>, _: Option<&Path>, _: &Parameters) -> Result<()> {
        self.calls += 1;
        COUNTER_RUNS
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .push(self.calls);
        Ok(())
    }

    fn describe_metadata(&self) -> ScriptMetadata {
        ScriptMetadata::new("Counter")
    }
}

// Each execute builds its own unit, so per-instance state starts fresh.
#[test]
fn consecutive_executions_use_independent_instances() -> Result<()> {
    let mut units = UnitTable::new();
    units.register_script_type::<CallCounter>("tests::counter", "CallCounter");
    let controller =
        controller_with(vec![record("Counter", "tests::counter", "CallCounter")], units);

    controller.execute("Counter", None, None, Parameters::new())?;
    controller.execute("Counter", None, None, Parameters::new())?;
    let runs = COUNTER_RUNS.lock().map_err(|_| anyhow!("poisoned"))?;
    assert_eq!(*runs, vec![1, 1]);
    Ok(())
}

static ADDITION_CALLS: Mutex<Vec<(f64, f64)>> = Mutex::new(Vec::new());

#[derive(Default)]
struct AdditionSpy;

impl Script for AdditionSpy {
    fn run(&mut self, _: Option<&Path>, output: Option<&Path>, params: &Parameters) -> Result<()> {
        if output.is_none() {
            bail!("spy expects an output path");
        }
        ADDITION_CALLS
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .push((params.float("a")?, params.float("b")?));
        Ok(())
    }

    fn describe_metadata(&self) -> ScriptMetadata {
        ScriptMetadata::new("Addition")
            .parameter("a", ParamType::Float, 0.0, "First number")
            .parameter("b", ParamType::Float, 0.0, "Second number")
    }
}

// The unit's run sees exactly the supplied parameter values.
#[test]
fn addition_receives_supplied_parameters() -> Result<()> {
    let mut units = UnitTable::new();
    units.register_script_type::<AdditionSpy>("scripts::addition", "AdditionScript");
    let controller = controller_with(vec![addition_record()], units);

    let temp = TempDir::new()?;
    let params: Parameters = [("a", 2.0), ("b", 3.0)].into_iter().collect();
    controller.execute("Addition", None, Some(&temp.path().join("out.csv")), params)?;

    let calls = ADDITION_CALLS.lock().map_err(|_| anyhow!("poisoned"))?;
    assert_eq!(*calls, vec![(2.0, 3.0)]);
    Ok(())
}

#[test]
fn bundled_addition_writes_result_file() -> Result<()> {
    let controller = controller_with(vec![addition_record()], UnitTable::builtin());
    let temp = TempDir::new()?;
    let out = temp.path().join("sum.csv");

    // `b` is left to its default.
    let params: Parameters = [("a", 2_i64)].into_iter().collect();
    controller.execute("Addition", None, Some(&out), params)?;
    assert_eq!(
        fs::read_to_string(&out)?,
        "nombre1,nombre2,résultat\n2.0,0.0,2.0\n"
    );
    Ok(())
}

#[derive(Default)]
struct Exploding;

impl Script for Exploding {
    fn run(&mut self, _: Option<&Path>, _: Option<&Path>, _: &Parameters) -> Result<()> {
        Err(anyhow!("boom"))
    }

    fn describe_metadata(&self) -> ScriptMetadata {
        ScriptMetadata::new("Exploding")
    }
}

// Unit failures surface as ExecutionError naming the script and the cause.
#[test]
fn unit_failure_is_execution_error() {
    let mut units = UnitTable::new();
    units.register_script_type::<Exploding>("tests::exploding", "Exploding");
    let controller = controller_with(
        vec![record("Detonator", "tests::exploding", "Exploding")],
        units,
    );

    let err = controller
        .execute("Detonator", None, None, Parameters::new())
        .unwrap_err();
    let ScriptError::Execution(inner) = &err else {
        panic!("expected execution error, got {err}");
    };
    assert_eq!(inner.script, "Detonator");
    let message = err.to_string();
    assert!(message.contains("Detonator"));
    assert!(message.contains("boom"));
    assert_eq!(inner.source().map(|cause| cause.to_string()).as_deref(), Some("boom"));
}

#[test]
fn parameters_are_checked_before_run() {
    let controller = controller_with(vec![addition_record()], UnitTable::builtin());

    let unknown: Parameters = [("c", 1.0)].into_iter().collect();
    let err = controller.execute("Addition", None, None, unknown).unwrap_err();
    assert_eq!(err.category(), "parameter");

    let mistyped: Parameters = [("a", "two")].into_iter().collect();
    let err = controller.execute("Addition", None, None, mistyped).unwrap_err();
    assert!(err.to_string().contains("parameter a expects float"));

    let raw = vec![("b".to_string(), "three".to_string())];
    let err = controller.execute_raw("Addition", None, None, &raw).unwrap_err();
    assert_eq!(err.category(), "parameter");
}

#[test]
fn metadata_disagreement_fails_resolution() {
    let mut raw = addition_record();
    raw["parameters"]["b"]["type"] = json!("int");
    raw["parameters"]["b"]["default"] = json!(0);
    let controller = controller_with(vec![raw], UnitTable::builtin());

    let err = controller
        .execute("Addition", None, None, Parameters::new())
        .unwrap_err();
    assert!(matches!(
        err,
        ScriptError::Import {
            source: ResolutionError::MetadataMismatch { .. },
            ..
        }
    ));
}

#[test]
fn background_execution_matches_foreground() -> Result<()> {
    let controller = controller_with(vec![addition_record()], UnitTable::builtin());
    let temp = TempDir::new()?;
    let out = temp.path().join("bg.csv");

    let params: Parameters = [("a", ParamValue::Float(1.5)), ("b", ParamValue::Float(1.0))]
        .into_iter()
        .collect();
    controller
        .spawn_execute("Addition", None, Some(out.clone()), params)
        .join()
        .map_err(|_| anyhow!("worker panicked"))??;
    assert!(fs::read_to_string(&out)?.ends_with("1.5,1.0,2.5\n"));

    let err = controller
        .spawn_execute("Addition", None, None, Parameters::new())
        .join()
        .map_err(|_| anyhow!("worker panicked"))?
        .unwrap_err();
    assert_eq!(err.category(), "execution");
    Ok(())
}

const PARALLEL_RUNS: usize = 8;

static PARALLEL_BUILT: AtomicUsize = AtomicUsize::new(0);
static PARALLEL_CALLS: Mutex<Vec<usize>> = Mutex::new(Vec::new());
static PARALLEL_GATE: OnceLock<Barrier> = OnceLock::new();

struct ParallelCounter {
    calls: usize,
}

impl Default for ParallelCounter {
    fn default() -> Self {
        PARALLEL_BUILT.fetch_add(1, Ordering::SeqCst);
        Self { calls: 0 }
    }
}

impl Script for ParallelCounter {
    fn run(&mut self, _: Option<&Path>, _: Option<&Path>, _: &Parameters) -> Result<()> {
        self.calls += 1;
        // Every worker is inside `run` at once before any of them returns.
        PARALLEL_GATE
            .get_or_init(|| Barrier::new(PARALLEL_RUNS))
            .wait();
        PARALLEL_CALLS
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .push(self.calls);
        Ok(())
    }

    fn describe_metadata(&self) -> ScriptMetadata {
        ScriptMetadata::new("Parallel")
    }
}

// Concurrent callers share one controller but never share a unit instance.
#[test]
fn concurrent_executions_build_separate_instances() -> Result<()> {
    let mut units = UnitTable::new();
    units.register_script_type::<ParallelCounter>("tests::parallel", "ParallelCounter");
    let controller = controller_with(
        vec![record("Parallel", "tests::parallel", "ParallelCounter")],
        units,
    );

    let handles: Vec<_> = (0..PARALLEL_RUNS)
        .map(|_| controller.spawn_execute("Parallel", None, None, Parameters::new()))
        .collect();
    for handle in handles {
        handle.join().map_err(|_| anyhow!("worker panicked"))??;
    }

    assert_eq!(PARALLEL_BUILT.load(Ordering::SeqCst), PARALLEL_RUNS);
    let calls = PARALLEL_CALLS.lock().map_err(|_| anyhow!("poisoned"))?;
    assert_eq!(*calls, vec![1; PARALLEL_RUNS]);
    Ok(())
}

// A blank form field takes the declared default instead of the empty text.
#[test]
fn blank_form_fields_use_declared_defaults() -> Result<()> {
    let path = repo_root().join("config").join("scripts_config.yaml");
    let controller = ScriptController::load(&FileSource::new(&path), UnitTable::builtin())?;
    let temp = TempDir::new()?;
    let input = temp.path().join("in.csv");
    let output = temp.path().join("out.csv");
    fs::write(&input, " id , text \n1,hello\n")?;

    let raw = vec![("delimiter".to_string(), String::new())];
    controller.execute_raw("Strip CSV headers", Some(&input), Some(&output), &raw)?;
    assert_eq!(fs::read_to_string(&output)?, "id,text\n1,hello\n");

    let sum = temp.path().join("sum.csv");
    let raw = vec![("a".to_string(), "4".to_string()), ("b".to_string(), " ".to_string())];
    controller.execute_raw("Addition", None, Some(&sum), &raw)?;
    assert_eq!(fs::read_to_string(&sum)?, "nombre1,nombre2,résultat\n4.0,0.0,4.0\n");
    Ok(())
}

#[test]
fn cli_lists_and_describes_scripts() -> Result<()> {
    let temp = TempDir::new()?;
    let config = write_config(
        temp.path(),
        "scripts.yaml",
        &[addition_record(), record("Other", "scripts::addition", "AdditionScript")],
    )?;

    let mut list = script_runner(&config);
    list.arg("--list");
    let output = run_command(list)?;
    assert_eq!(String::from_utf8(output.stdout)?, "Addition\nOther\n");

    let mut describe = script_runner(&config);
    describe.arg("--describe").arg("Addition");
    let output = run_command(describe)?;
    let described: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(described, addition_record());
    Ok(())
}

#[test]
fn cli_runs_addition_with_text_parameters() -> Result<()> {
    let temp = TempDir::new()?;
    let config = write_config(temp.path(), "scripts.json", &[addition_record()])?;

    for (file_name, background) in [("fg.csv", false), ("bg.csv", true)] {
        let out = temp.path().join(file_name);
        let mut cmd = script_runner(&config);
        cmd.args(["--run", "Addition", "--param", "a=2", "--param", "b=3.0"])
            .arg("--output")
            .arg(&out);
        if background {
            cmd.arg("--background");
        }
        run_command(cmd)?;
        assert_eq!(
            fs::read_to_string(&out)?,
            "nombre1,nombre2,résultat\n2.0,3.0,5.0\n"
        );
    }
    Ok(())
}

#[test]
fn cli_reports_failures_with_exit_code() -> Result<()> {
    let temp = TempDir::new()?;
    let config = write_config(temp.path(), "scripts.yaml", &[addition_record()])?;

    let mut cmd = script_runner(&config);
    cmd.args(["--run", "Missing"]);
    let output = cmd.output()?;
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("script Missing not found"));

    let mut broken = addition_record();
    broken["parameters"]["a"]["type"] = json!("decimal");
    let bad_config = write_config(temp.path(), "bad.yaml", &[broken])?;
    let mut cmd = script_runner(&bad_config);
    cmd.arg("--list");
    let output = cmd.output()?;
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unsupported type for a: decimal"));
    Ok(())
}

// Background runs report unknown names and bad text through the same logged
// execution path as foreground runs.
#[test]
fn cli_background_failures_are_logged() -> Result<()> {
    let temp = TempDir::new()?;
    let config = write_config(temp.path(), "scripts.yaml", &[addition_record()])?;
    let log = temp.path().join("bg.log");

    for args in [
        ["--run", "Missing", "--param", "a=1"],
        ["--run", "Addition", "--param", "a=lots"],
    ] {
        let mut cmd = script_runner(&config);
        cmd.env("SCRIPTRUNNER_LOG", "info")
            .arg("--log-file")
            .arg(&log)
            .args(args)
            .arg("--background");
        let output = cmd.output()?;
        assert_eq!(output.status.code(), Some(1));
    }

    let contents = fs::read_to_string(&log)?;
    assert_eq!(contents.matches("starting script").count(), 2);
    assert_eq!(contents.matches("script failed").count(), 2);
    assert!(contents.contains("not_found"));
    assert!(contents.contains("parameter"));
    Ok(())
}

#[test]
fn cli_log_file_receives_execution_records() -> Result<()> {
    let temp = TempDir::new()?;
    let config = write_config(temp.path(), "scripts.yaml", &[addition_record()])?;
    let log = temp.path().join("outputs").join("log.txt");

    let mut cmd = script_runner(&config);
    cmd.env("SCRIPTRUNNER_LOG", "info")
        .arg("--log-file")
        .arg(&log)
        .args(["--run", "Addition"])
        .arg("--output")
        .arg(temp.path().join("sum.csv"));
    run_command(cmd)?;

    let contents = fs::read_to_string(&log)?;
    assert!(contents.contains("starting script"));
    assert!(contents.contains("script finished"));
    Ok(())
}
