use nalgebra::Vector3;
use rand::{Rng, RngCore};
use rand_distr::Distribution as _;
use serde::{Serialize, Deserialize};
use std::any::Any;
use std::convert::TryFrom;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use crate::distr::{self, Distribution, DistrVector};
use crate::error::{Error, Result};

/// Dynamically-typed element values and their kind tags.
mod value;

pub use value::*;

/// Adapter exposing interleaved mixture-parameter arrays as GaussianMixture elements.
mod gmm;

pub use gmm::*;

/// How get_item resolves a stored distribution. Fixed when the array is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {

    /// Return the stored element as is.
    Raw,

    /// Return a fresh realization of the stored distribution (per component for vectors).
    Sampled
}

impl Default for Policy {

    fn default() -> Self {
        Policy::Raw
    }

}

/// Index-addressable storage of per-sample values, where each sample is either
/// a plain value or a distribution. Implementors adapt any backing layout; callers
/// only rely on indexed access.
pub trait DataArray {

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Kind of the values yielded by get_item (after the policy is applied).
    fn kind(&self) -> Kind;

    fn policy(&self) -> Policy;

    /// Element at idx, drawing from the informed generator under Policy::Sampled.
    fn get_item_with(&self, idx : usize, rng : &mut dyn RngCore) -> Result<Value>;

    /// Element at idx, drawing from the thread-local generator under Policy::Sampled.
    fn get_item(&self, idx : usize) -> Result<Value> {
        self.get_item_with(idx, &mut rand::thread_rng())
    }

    /// Overwrites the stored element at idx. The value must match the stored kind.
    fn set_item(&mut self, idx : usize, value : Value) -> Result<()>;

    /// Backing storage, for bulk operations by callers that know the concrete adapter.
    fn raw_array(&self) -> &dyn Any;

}

/// Element types that can be held by a DenseArray.
pub trait Element : Clone + Send + Sync + 'static {

    const KIND : Kind;

    fn into_value(self) -> Value;

    fn from_value(v : Value) -> Result<Self>;

    /// Value yielded under Policy::Sampled. Plain values are returned unchanged.
    fn sampled<R : Rng + ?Sized>(&self, rng : &mut R) -> Value;

    /// Kind yielded under Policy::Sampled.
    fn sampled_kind() -> Kind {
        Self::KIND
    }

}

impl Element for f64 {

    const KIND : Kind = Kind::Scalar;

    fn into_value(self) -> Value {
        Value::Scalar(self)
    }

    fn from_value(v : Value) -> Result<Self> {
        f64::try_from(v)
    }

    fn sampled<R : Rng + ?Sized>(&self, _rng : &mut R) -> Value {
        Value::Scalar(*self)
    }

}

impl Element for Vector3<f64> {

    const KIND : Kind = Kind::Vector;

    fn into_value(self) -> Value {
        Value::Vector(self)
    }

    fn from_value(v : Value) -> Result<Self> {
        Vector3::try_from(v)
    }

    fn sampled<R : Rng + ?Sized>(&self, _rng : &mut R) -> Value {
        Value::Vector(*self)
    }

}

impl Element for Distribution {

    const KIND : Kind = Kind::Distr;

    fn into_value(self) -> Value {
        Value::Distr(self)
    }

    fn from_value(v : Value) -> Result<Self> {
        Distribution::try_from(v)
    }

    fn sampled<R : Rng + ?Sized>(&self, rng : &mut R) -> Value {
        Value::Scalar(self.sample(rng))
    }

    fn sampled_kind() -> Kind {
        Kind::Scalar
    }

}

impl Element for DistrVector {

    const KIND : Kind = Kind::DistrVector;

    fn into_value(self) -> Value {
        Value::DistrVector(self)
    }

    fn from_value(v : Value) -> Result<Self> {
        DistrVector::try_from(v)
    }

    fn sampled<R : Rng + ?Sized>(&self, rng : &mut R) -> Value {
        Value::Vector(distr::sample_vector(self, rng))
    }

    fn sampled_kind() -> Kind {
        Kind::Vector
    }

}

/// Reference-counted backing buffer. Clones share the same storage, so arrays
/// with different policies can view one physical buffer.
#[derive(Debug)]
pub struct SharedArray<T> {
    data : Arc<RwLock<Vec<T>>>
}

impl<T> Clone for SharedArray<T> {

    fn clone(&self) -> Self {
        Self { data : Arc::clone(&self.data) }
    }

}

impl<T> SharedArray<T> {

    pub fn new(data : Vec<T>) -> Self {
        Self { data : Arc::new(RwLock::new(data)) }
    }

    /// A poisoned lock still holds consistent data: element writes are single assignments.
    pub fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.data.read().unwrap_or_else(|e| e.into_inner() )
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.data.write().unwrap_or_else(|e| e.into_inner() )
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when both handles view the same buffer.
    pub fn shares(&self, other : &SharedArray<T>) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

}

impl<T> From<Vec<T>> for SharedArray<T> {

    fn from(data : Vec<T>) -> Self {
        Self::new(data)
    }

}

/// Generic DataArray over a contiguous shared buffer of elements.
#[derive(Debug, Clone)]
pub struct DenseArray<T> {

    data : SharedArray<T>,

    policy : Policy
}

impl<T> DenseArray<T>
where
    T : Element
{

    pub fn new<S : Into<SharedArray<T>>>(data : S, policy : Policy) -> Self {
        let data = data.into();
        debug!(len = data.len(), kind = ?T::KIND, ?policy, "dense array created");
        Self { data, policy }
    }

    pub fn raw(data : impl Into<SharedArray<T>>) -> Self {
        Self::new(data, Policy::Raw)
    }

    pub fn sampled(data : impl Into<SharedArray<T>>) -> Self {
        Self::new(data, Policy::Sampled)
    }

    pub fn shared(&self) -> &SharedArray<T> {
        &self.data
    }

    fn check_index(&self, idx : usize, len : usize) -> Result<()> {
        if idx >= len {
            return Err(Error::IndexOutOfRange { index : idx, len });
        }
        Ok(())
    }

}

impl<T> DataArray for DenseArray<T>
where
    T : Element
{

    fn len(&self) -> usize {
        self.data.len()
    }

    fn kind(&self) -> Kind {
        match self.policy {
            Policy::Raw => T::KIND,
            Policy::Sampled => T::sampled_kind()
        }
    }

    fn policy(&self) -> Policy {
        self.policy
    }

    fn get_item_with(&self, idx : usize, rng : &mut dyn RngCore) -> Result<Value> {
        let data = self.data.read();
        self.check_index(idx, data.len())?;
        Ok(match self.policy {
            Policy::Raw => data[idx].clone().into_value(),
            Policy::Sampled => data[idx].sampled(rng)
        })
    }

    fn set_item(&mut self, idx : usize, value : Value) -> Result<()> {
        let item = T::from_value(value)?;
        let mut data = self.data.write();
        self.check_index(idx, data.len())?;
        data[idx] = item;
        Ok(())
    }

    fn raw_array(&self) -> &dyn Any {
        &self.data
    }

}
