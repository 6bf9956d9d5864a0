use nalgebra::Vector3;
use serde::{Serialize, Deserialize};
use std::convert::TryFrom;
use std::fmt;
use crate::distr::{Distribution, DistrVector, Gaussian, GaussianMixture};
use crate::error::Error;

/// Tag of the element kind held or yielded by a data array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Scalar,
    Vector,
    Distr,
    DistrVector
}

/// Dynamically-typed element exchanged through the DataArray interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Scalar(f64),
    Vector(Vector3<f64>),
    Distr(Distribution),
    DistrVector(DistrVector)
}

impl Value {

    pub fn kind(&self) -> Kind {
        match self {
            Value::Scalar(_) => Kind::Scalar,
            Value::Vector(_) => Kind::Vector,
            Value::Distr(_) => Kind::Distr,
            Value::DistrVector(_) => Kind::DistrVector
        }
    }

}

impl fmt::Display for Value {

    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => write!(f, "{}", s),
            Value::Vector(v) => write!(f, "({}, {}, {})", v[0], v[1], v[2]),
            Value::Distr(d) => write!(f, "{}", d),
            Value::DistrVector(v) => write!(f, "[{}, {}, {}]", v[0], v[1], v[2])
        }
    }

}

fn mismatch(expected : Kind, found : &Value) -> Error {
    Error::TypeMismatch { expected, found : found.kind() }
}

impl TryFrom<Value> for f64 {

    type Error = Error;

    fn try_from(v : Value) -> Result<Self, Error> {
        match v {
            Value::Scalar(s) => Ok(s),
            other => Err(mismatch(Kind::Scalar, &other))
        }
    }

}

impl TryFrom<Value> for Vector3<f64> {

    type Error = Error;

    fn try_from(v : Value) -> Result<Self, Error> {
        match v {
            Value::Vector(s) => Ok(s),
            other => Err(mismatch(Kind::Vector, &other))
        }
    }

}

impl TryFrom<Value> for Distribution {

    type Error = Error;

    fn try_from(v : Value) -> Result<Self, Error> {
        match v {
            Value::Distr(d) => Ok(d),
            other => Err(mismatch(Kind::Distr, &other))
        }
    }

}

impl TryFrom<Value> for DistrVector {

    type Error = Error;

    fn try_from(v : Value) -> Result<Self, Error> {
        match v {
            Value::DistrVector(d) => Ok(d),
            other => Err(mismatch(Kind::DistrVector, &other))
        }
    }

}

impl From<f64> for Value {

    fn from(s : f64) -> Self {
        Value::Scalar(s)
    }

}

impl From<Vector3<f64>> for Value {

    fn from(v : Vector3<f64>) -> Self {
        Value::Vector(v)
    }

}

impl From<Distribution> for Value {

    fn from(d : Distribution) -> Self {
        Value::Distr(d)
    }

}

impl From<Gaussian> for Value {

    fn from(g : Gaussian) -> Self {
        Value::Distr(g.into())
    }

}

impl From<GaussianMixture> for Value {

    fn from(m : GaussianMixture) -> Self {
        Value::Distr(m.into())
    }

}

impl From<DistrVector> for Value {

    fn from(v : DistrVector) -> Self {
        Value::DistrVector(v)
    }

}
