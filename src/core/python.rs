//! Purpose: Embedded CPython runtime resolving the external AIS `decode` entry point.
//! Exports: `PythonRuntime`, `PythonDecoder`, `create_decoder`.
//! Role: The only place that touches the interpreter; classifies returned dicts under the GIL.
//! Invariants: At most one live `PythonRuntime` per process; the claim is dropped on release.
//! Invariants: Python references are released while holding the GIL.
//! Notes: `bool` is an `int` subtype in Python and classifies as an integer (0/1).
use std::sync::atomic::{AtomicBool, Ordering};

use pyo3::prelude::*;
use pyo3::types::{PyBool, PyBytes, PyDict, PyFloat, PyLong, PyString};
use tracing::info;

use crate::core::config::DecoderConfig;
use crate::core::decoder::Decoder;
use crate::core::error::{Error, ErrorKind};
use crate::core::record::{DynamicKey, DynamicRecord, DynamicValue};
use crate::core::runtime::{CallArgs, ForeignRuntime};

static INTERPRETER_CLAIMED: AtomicBool = AtomicBool::new(false);

pub type PythonDecoder = Decoder<PythonRuntime>;

/// Initializes the interpreter, resolves `config.module.config.function`, and wraps it.
pub fn create_decoder(config: &DecoderConfig) -> Result<PythonDecoder, Error> {
    let runtime = PythonRuntime::start(config)?;
    Ok(Decoder::start(runtime, config))
}

pub struct PythonRuntime {
    module: Option<Py<PyModule>>,
    function: Option<Py<PyAny>>,
    claimed: bool,
}

impl PythonRuntime {
    pub fn start(config: &DecoderConfig) -> Result<Self, Error> {
        config.validate()?;
        if INTERPRETER_CLAIMED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::new(ErrorKind::Initialization)
                .with_message("another decoder already owns the embedded interpreter"));
        }

        let mut runtime = Self {
            module: None,
            function: None,
            claimed: true,
        };
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| runtime.resolve(py, config))?;
        info!(
            module = %config.module,
            function = %config.function,
            "python runtime ready"
        );
        Ok(runtime)
    }

    fn resolve(&mut self, py: Python<'_>, config: &DecoderConfig) -> Result<(), Error> {
        let module = py.import_bound(config.module.as_str()).map_err(|err| {
            Error::new(ErrorKind::Initialization)
                .with_message(format!("failed to import module `{}`", config.module))
                .with_source(err)
        })?;
        let function = module.getattr(config.function.as_str()).map_err(|err| {
            Error::new(ErrorKind::Initialization)
                .with_message(format!(
                    "module `{}` has no attribute `{}`",
                    config.module, config.function
                ))
                .with_source(err)
        })?;
        if !function.is_callable() {
            return Err(Error::new(ErrorKind::Initialization)
                .with_message(format!(
                    "`{}.{}` is not callable",
                    config.module, config.function
                ))
                .with_type_name(type_name(&function)));
        }

        self.function = Some(function.unbind());
        self.module = Some(module.unbind());
        Ok(())
    }
}

impl ForeignRuntime for PythonRuntime {
    fn invoke(&mut self, args: &CallArgs) -> Result<DynamicRecord, Error> {
        let function = self.function.as_ref().ok_or_else(|| {
            Error::new(ErrorKind::UseAfterDestroy).with_message("python runtime released")
        })?;

        Python::with_gil(|py| {
            let result = function
                .bind(py)
                .call1((args.body(), args.padding()))
                .map_err(|err| {
                    Error::new(ErrorKind::Invocation)
                        .with_message(err.to_string())
                        .with_source(err)
                })?;
            let dict = result.downcast::<PyDict>().map_err(|_| {
                Error::new(ErrorKind::Invocation)
                    .with_message("decode did not return a dict")
                    .with_type_name(type_name(&result))
            })?;
            Ok(classify(dict))
        })
    }

    fn release(&mut self) {
        let function = self.function.take();
        let module = self.module.take();
        if function.is_some() || module.is_some() {
            Python::with_gil(|_py| {
                drop(function);
                drop(module);
            });
        }
        if self.claimed {
            self.claimed = false;
            INTERPRETER_CLAIMED.store(false, Ordering::Release);
            info!("python runtime released");
        }
    }
}

impl Drop for PythonRuntime {
    fn drop(&mut self) {
        self.release();
    }
}

fn classify(dict: &Bound<'_, PyDict>) -> DynamicRecord {
    let mut record = DynamicRecord::with_capacity(dict.len());
    for (key, value) in dict.iter() {
        record.push(classify_key(&key), classify_value(&value));
    }
    record
}

fn classify_key(key: &Bound<'_, PyAny>) -> DynamicKey {
    match key.downcast::<PyString>() {
        Ok(text) => DynamicKey::Text(text.to_string_lossy().into_owned()),
        Err(_) => DynamicKey::NonText {
            type_name: type_name(key),
        },
    }
}

fn classify_value(value: &Bound<'_, PyAny>) -> DynamicValue {
    if let Ok(text) = value.downcast::<PyString>() {
        return DynamicValue::Text(text.to_string_lossy().into_owned());
    }
    if let Ok(bytes) = value.downcast::<PyBytes>() {
        return DynamicValue::Text(String::from_utf8_lossy(bytes.as_bytes()).into_owned());
    }
    // bool before int: it is a subclass
    if let Ok(flag) = value.downcast::<PyBool>() {
        return DynamicValue::Integer(i64::from(flag.is_true()));
    }
    if value.is_instance_of::<PyLong>() {
        return classify_int(value);
    }
    if let Ok(number) = value.downcast::<PyFloat>() {
        return DynamicValue::Float(number.value());
    }
    DynamicValue::Unsupported {
        type_name: type_name(value),
    }
}

/// Exact up to `u64::MAX`; wider ints become the nearest `f64`, and ints past
/// `f64` range keep their decimal text.
fn classify_int(value: &Bound<'_, PyAny>) -> DynamicValue {
    if let Ok(number) = value.extract::<i64>() {
        return DynamicValue::Integer(number);
    }
    if let Ok(number) = value.extract::<u64>() {
        return DynamicValue::Unsigned(number);
    }
    if let Ok(number) = value.extract::<f64>() {
        return DynamicValue::Float(number);
    }
    match value.str() {
        Ok(text) => DynamicValue::Text(text.to_string_lossy().into_owned()),
        Err(_) => DynamicValue::Unsupported {
            type_name: type_name(value),
        },
    }
}

fn type_name(value: &Bound<'_, PyAny>) -> String {
    value
        .get_type()
        .name()
        .map(|name| name.to_string())
        .unwrap_or_else(|_| "<unknown>".to_string())
}
