//! Python bindings for doe-rsm.
//!
//! This module exposes design generation, stationary-point analysis and the
//! desirability functions to Python using PyO3. Enable the `python` feature
//! to use this.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyList;

use crate::design::{central_composite as build_ccd, full_factorial as build_factorial};
use crate::design::{CcdVariant, Design, DEFAULT_CENTER_POINTS};
use crate::error::Error;
use crate::rsm::Coefficients;

fn to_py_err(e: Error) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Python wrapper for Design
#[pyclass(name = "Design")]
pub struct PyDesign {
    inner: Design,
}

#[pymethods]
impl PyDesign {
    /// Get the number of runs.
    #[getter]
    fn runs(&self) -> usize {
        self.inner.runs()
    }

    /// Get the number of factors.
    #[getter]
    fn factors(&self) -> usize {
        self.inner.factors()
    }

    /// Get the factor names.
    #[getter]
    fn factor_names(&self) -> Vec<String> {
        self.inner.factor_names().to_vec()
    }

    /// Get the axial distance, if the design has axial points.
    #[getter]
    fn alpha(&self) -> Option<f64> {
        self.inner.alpha()
    }

    /// Get the point kind of every run.
    fn kinds(&self) -> Vec<&'static str> {
        self.inner.kinds().iter().map(|k| k.as_str()).collect()
    }

    /// Get the coded levels as a list of lists.
    fn points(&self, py: Python<'_>) -> PyResult<PyObject> {
        let list = PyList::empty(py);
        for row in self.inner.points().rows() {
            let row_list = PyList::empty(py);
            for &v in row {
                row_list.append(v)?;
            }
            list.append(row_list)?;
        }
        Ok(list.into())
    }

    fn __repr__(&self) -> String {
        format!(
            "Design(runs={}, factors={})",
            self.inner.runs(),
            self.inner.factors()
        )
    }
}

/// Python wrapper for StationaryPoint
#[pyclass(name = "StationaryPoint")]
#[derive(Clone)]
pub struct PyStationaryPoint {
    /// Coded level of the first factor
    #[pyo3(get)]
    pub x1: f64,
    /// Coded level of the second factor
    #[pyo3(get)]
    pub x2: f64,
    /// Predicted response
    #[pyo3(get)]
    pub predicted: f64,
    /// One of "maximum", "minimum", "saddle", "degenerate"
    #[pyo3(get)]
    pub kind: String,
    /// Canonical eigenvalues
    #[pyo3(get)]
    pub eigenvalues: (f64, f64),
}

/// Generate a 2^k full factorial design.
#[pyfunction]
#[pyo3(signature = (factors, names=None))]
fn full_factorial(factors: usize, names: Option<Vec<String>>) -> PyResult<PyDesign> {
    let names: Option<Vec<&str>> = names
        .as_ref()
        .map(|n| n.iter().map(String::as_str).collect());
    let design = build_factorial(factors, names.as_deref()).map_err(to_py_err)?;
    Ok(PyDesign { inner: design })
}

/// Generate a central composite design.
#[pyfunction]
#[pyo3(signature = (factors, center_points=DEFAULT_CENTER_POINTS, variant="ccc"))]
fn central_composite(factors: usize, center_points: usize, variant: &str) -> PyResult<PyDesign> {
    let variant = match variant {
        "ccc" => CcdVariant::Circumscribed,
        "cci" => CcdVariant::Inscribed,
        "ccf" => CcdVariant::FaceCentered,
        other => {
            return Err(PyValueError::new_err(format!(
                "unknown CCD variant '{other}', expected ccc, cci or ccf"
            )))
        }
    };
    let design = build_ccd(factors, variant, center_points).map_err(to_py_err)?;
    Ok(PyDesign { inner: design })
}

/// Target-is-best desirability.
#[pyfunction]
fn target_desirability(y: f64, target: f64, tolerance: f64) -> f64 {
    crate::desirability::target_desirability(y, target, tolerance)
}

/// Geometric mean of desirabilities.
#[pyfunction]
fn overall_desirability(values: Vec<f64>) -> f64 {
    crate::desirability::overall_desirability(&values)
}

/// Stationary point of ŷ = b0 + b1·x1 + b2·x2 + b11·x1² + b22·x2² + b12·x1·x2.
#[pyfunction]
fn find_stationary_point(
    b0: f64,
    b1: f64,
    b2: f64,
    b11: f64,
    b22: f64,
    b12: f64,
) -> PyStationaryPoint {
    let sp = crate::rsm::find_stationary_point(&Coefficients {
        b0,
        b1,
        b2,
        b11,
        b22,
        b12,
    });
    PyStationaryPoint {
        x1: sp.x1,
        x2: sp.x2,
        predicted: sp.predicted,
        kind: sp.kind.to_string(),
        eigenvalues: (sp.eigenvalues[0], sp.eigenvalues[1]),
    }
}

/// The doe_rsm Python module.
#[pymodule]
fn doe_rsm(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyDesign>()?;
    m.add_class::<PyStationaryPoint>()?;
    m.add_function(wrap_pyfunction!(full_factorial, m)?)?;
    m.add_function(wrap_pyfunction!(central_composite, m)?)?;
    m.add_function(wrap_pyfunction!(target_desirability, m)?)?;
    m.add_function(wrap_pyfunction!(overall_desirability, m)?)?;
    m.add_function(wrap_pyfunction!(find_stationary_point, m)?)?;
    Ok(())
}
