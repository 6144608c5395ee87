//! Column layout of the Ultra arithmetization.
//!
//! Every polynomial the prover handles is addressed by an [`Entity`]. Precomputed columns
//! come from the proving key, witness columns are produced round by round, and shifted
//! columns are views `p_shift[i] = p[i + 1]` of a to-be-shifted column. Containers are
//! [`AllEntities`], indexed by `Entity`.
use crate::errors::HonkError;
use core::ops::{Index, IndexMut};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Number of precomputed (selector, permutation, table and Lagrange) columns
pub const NUM_PRECOMPUTED_ENTITIES: usize = 22;
/// Number of witness columns committed by the prover
pub const NUM_WITNESS_ENTITIES: usize = 7;
/// Number of shifted views
pub const NUM_SHIFTED_ENTITIES: usize = 7;
/// Number of columns that are opened without a shift
pub const NUM_UNSHIFTED_ENTITIES: usize = NUM_PRECOMPUTED_ENTITIES + NUM_WITNESS_ENTITIES;
/// Total number of entities
pub const NUM_ALL_ENTITIES: usize = NUM_UNSHIFTED_ENTITIES + NUM_SHIFTED_ENTITIES;
/// Number of wire columns
pub const NUM_WIRES: usize = 4;
/// Smallest supported circuit size; two fold rounds are the minimum the opening protocol
/// is defined for
pub const MIN_CIRCUIT_SIZE: usize = 4;

/// A column of the Ultra arithmetization
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Entity {
  // precomputed
  QM,
  QL,
  QR,
  QO,
  Q4,
  QC,
  QArith,
  QLookup,
  Sigma1,
  Sigma2,
  Sigma3,
  Sigma4,
  Id1,
  Id2,
  Id3,
  Id4,
  Table1,
  Table2,
  Table3,
  Table4,
  LagrangeFirst,
  LagrangeLast,
  // witness
  W1,
  W2,
  W3,
  W4,
  SortedAccum,
  ZPerm,
  ZLookup,
  // shifted
  Table1Shift,
  Table2Shift,
  Table3Shift,
  Table4Shift,
  SortedAccumShift,
  ZPermShift,
  ZLookupShift,
}

impl Entity {
  /// All entities, in storage order
  pub const ALL: [Entity; NUM_ALL_ENTITIES] = [
    Entity::QM,
    Entity::QL,
    Entity::QR,
    Entity::QO,
    Entity::Q4,
    Entity::QC,
    Entity::QArith,
    Entity::QLookup,
    Entity::Sigma1,
    Entity::Sigma2,
    Entity::Sigma3,
    Entity::Sigma4,
    Entity::Id1,
    Entity::Id2,
    Entity::Id3,
    Entity::Id4,
    Entity::Table1,
    Entity::Table2,
    Entity::Table3,
    Entity::Table4,
    Entity::LagrangeFirst,
    Entity::LagrangeLast,
    Entity::W1,
    Entity::W2,
    Entity::W3,
    Entity::W4,
    Entity::SortedAccum,
    Entity::ZPerm,
    Entity::ZLookup,
    Entity::Table1Shift,
    Entity::Table2Shift,
    Entity::Table3Shift,
    Entity::Table4Shift,
    Entity::SortedAccumShift,
    Entity::ZPermShift,
    Entity::ZLookupShift,
  ];

  /// Columns fixed by the circuit, committed in the verification key
  pub const PRECOMPUTED: [Entity; NUM_PRECOMPUTED_ENTITIES] = [
    Entity::QM,
    Entity::QL,
    Entity::QR,
    Entity::QO,
    Entity::Q4,
    Entity::QC,
    Entity::QArith,
    Entity::QLookup,
    Entity::Sigma1,
    Entity::Sigma2,
    Entity::Sigma3,
    Entity::Sigma4,
    Entity::Id1,
    Entity::Id2,
    Entity::Id3,
    Entity::Id4,
    Entity::Table1,
    Entity::Table2,
    Entity::Table3,
    Entity::Table4,
    Entity::LagrangeFirst,
    Entity::LagrangeLast,
  ];

  /// Columns committed by the prover
  pub const WITNESS: [Entity; NUM_WITNESS_ENTITIES] = [
    Entity::W1,
    Entity::W2,
    Entity::W3,
    Entity::W4,
    Entity::SortedAccum,
    Entity::ZPerm,
    Entity::ZLookup,
  ];

  /// Sources of the shifted views, in the order of [`Entity::SHIFTED`]
  pub const TO_BE_SHIFTED: [Entity; NUM_SHIFTED_ENTITIES] = [
    Entity::Table1,
    Entity::Table2,
    Entity::Table3,
    Entity::Table4,
    Entity::SortedAccum,
    Entity::ZPerm,
    Entity::ZLookup,
  ];

  /// Shifted views
  pub const SHIFTED: [Entity; NUM_SHIFTED_ENTITIES] = [
    Entity::Table1Shift,
    Entity::Table2Shift,
    Entity::Table3Shift,
    Entity::Table4Shift,
    Entity::SortedAccumShift,
    Entity::ZPermShift,
    Entity::ZLookupShift,
  ];

  /// The wire columns `w_l, w_r, w_o, w_4`
  pub const WIRES: [Entity; NUM_WIRES] = [Entity::W1, Entity::W2, Entity::W3, Entity::W4];

  /// The permutation columns `sigma_1..4`
  pub const SIGMAS: [Entity; NUM_WIRES] = [
    Entity::Sigma1,
    Entity::Sigma2,
    Entity::Sigma3,
    Entity::Sigma4,
  ];

  /// The identity columns `id_1..4`
  pub const IDS: [Entity; NUM_WIRES] = [Entity::Id1, Entity::Id2, Entity::Id3, Entity::Id4];

  /// The lookup table columns `table_1..4`
  pub const TABLES: [Entity; NUM_WIRES] = [
    Entity::Table1,
    Entity::Table2,
    Entity::Table3,
    Entity::Table4,
  ];

  /// Position of the entity in storage order
  pub const fn index(self) -> usize {
    self as usize
  }

  /// Returns true for shifted views
  pub const fn is_shifted(self) -> bool {
    self.index() >= NUM_UNSHIFTED_ENTITIES
  }

  /// For a shifted view, the column it is a view of
  pub fn unshifted(self) -> Option<Entity> {
    Entity::SHIFTED
      .iter()
      .position(|e| *e == self)
      .map(|i| Entity::TO_BE_SHIFTED[i])
  }

  /// The transcript label of the entity
  pub const fn label(self) -> &'static str {
    match self {
      Entity::QM => "Q_M",
      Entity::QL => "Q_L",
      Entity::QR => "Q_R",
      Entity::QO => "Q_O",
      Entity::Q4 => "Q_4",
      Entity::QC => "Q_C",
      Entity::QArith => "Q_ARITH",
      Entity::QLookup => "Q_LOOKUP",
      Entity::Sigma1 => "SIGMA_1",
      Entity::Sigma2 => "SIGMA_2",
      Entity::Sigma3 => "SIGMA_3",
      Entity::Sigma4 => "SIGMA_4",
      Entity::Id1 => "ID_1",
      Entity::Id2 => "ID_2",
      Entity::Id3 => "ID_3",
      Entity::Id4 => "ID_4",
      Entity::Table1 => "TABLE_1",
      Entity::Table2 => "TABLE_2",
      Entity::Table3 => "TABLE_3",
      Entity::Table4 => "TABLE_4",
      Entity::LagrangeFirst => "LAGRANGE_FIRST",
      Entity::LagrangeLast => "LAGRANGE_LAST",
      Entity::W1 => "W_1",
      Entity::W2 => "W_2",
      Entity::W3 => "W_3",
      Entity::W4 => "W_4",
      Entity::SortedAccum => "SORTED_ACCUM",
      Entity::ZPerm => "Z_PERM",
      Entity::ZLookup => "Z_LOOKUP",
      Entity::Table1Shift => "TABLE_1_SHIFT",
      Entity::Table2Shift => "TABLE_2_SHIFT",
      Entity::Table3Shift => "TABLE_3_SHIFT",
      Entity::Table4Shift => "TABLE_4_SHIFT",
      Entity::SortedAccumShift => "SORTED_ACCUM_SHIFT",
      Entity::ZPermShift => "Z_PERM_SHIFT",
      Entity::ZLookupShift => "Z_LOOKUP_SHIFT",
    }
  }
}

/// One value per [`Entity`], stored in [`Entity::ALL`] order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllEntities<T> {
  values: Vec<T>,
}

/// Evaluations of every column at a single point
pub type AllValues<F> = AllEntities<F>;

/// The full set of prover polynomials, shared cheaply between rounds
pub type ProverPolynomials<F> = AllEntities<Arc<Vec<F>>>;

impl<T> AllEntities<T> {
  /// Builds the container by evaluating `f` on every entity
  pub fn from_fn(f: impl FnMut(Entity) -> T) -> Self {
    Self {
      values: Entity::ALL.into_iter().map(f).collect(),
    }
  }

  /// Wraps a vector in storage order
  ///
  /// # Errors
  /// Returns `HonkError::InvalidInputLength` unless `values` has one entry per entity.
  pub fn try_from_vec(values: Vec<T>) -> Result<Self, HonkError> {
    if values.len() != NUM_ALL_ENTITIES {
      return Err(HonkError::InvalidInputLength);
    }
    Ok(Self { values })
  }

  /// Values in storage order
  pub fn as_slice(&self) -> &[T] {
    &self.values
  }

  /// Mutable values in storage order
  pub fn as_mut_slice(&mut self) -> &mut [T] {
    &mut self.values
  }

  /// Consumes the container and returns the values in storage order
  pub fn into_vec(self) -> Vec<T> {
    self.values
  }

  /// Iterates over `(entity, value)` pairs in storage order
  pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
    Entity::ALL.into_iter().zip(self.values.iter())
  }

  /// Applies `f` to every value
  pub fn map<U>(&self, mut f: impl FnMut(Entity, &T) -> U) -> AllEntities<U> {
    AllEntities {
      values: self.iter().map(|(e, v)| f(e, v)).collect(),
    }
  }

  /// Values of the unshifted columns (precomputed then witness)
  pub fn unshifted(&self) -> &[T] {
    &self.values[..NUM_UNSHIFTED_ENTITIES]
  }

  /// Values of the shifted views
  pub fn shifted(&self) -> &[T] {
    &self.values[NUM_UNSHIFTED_ENTITIES..]
  }
}

impl<T: Clone> AllEntities<T> {
  /// A container with every entry set to `value`
  pub fn splat(value: T) -> Self {
    Self {
      values: vec![value; NUM_ALL_ENTITIES],
    }
  }
}

impl<T> Index<Entity> for AllEntities<T> {
  type Output = T;

  #[inline(always)]
  fn index(&self, entity: Entity) -> &T {
    &self.values[entity.index()]
  }
}

impl<T> IndexMut<Entity> for AllEntities<T> {
  #[inline(always)]
  fn index_mut(&mut self, entity: Entity) -> &mut T {
    &mut self.values[entity.index()]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_storage_order_matches_enum() {
    for (i, e) in Entity::ALL.iter().enumerate() {
      assert_eq!(e.index(), i);
    }
    assert_eq!(&Entity::ALL[..NUM_PRECOMPUTED_ENTITIES], &Entity::PRECOMPUTED);
    assert_eq!(
      &Entity::ALL[NUM_PRECOMPUTED_ENTITIES..NUM_UNSHIFTED_ENTITIES],
      &Entity::WITNESS
    );
    assert_eq!(&Entity::ALL[NUM_UNSHIFTED_ENTITIES..], &Entity::SHIFTED);
  }

  #[test]
  fn test_shift_sources() {
    for (shifted, source) in Entity::SHIFTED.iter().zip(Entity::TO_BE_SHIFTED.iter()) {
      assert!(shifted.is_shifted());
      assert!(!source.is_shifted());
      assert_eq!(shifted.unshifted(), Some(*source));
      assert_eq!(shifted.label(), format!("{}_SHIFT", source.label()));
    }
    assert_eq!(Entity::W1.unshifted(), None);
  }

  #[test]
  fn test_container_indexing() {
    let mut all = AllEntities::from_fn(|e| e.index() * 10);
    assert_eq!(all[Entity::ZPerm], Entity::ZPerm.index() * 10);
    all[Entity::W4] = 7;
    assert_eq!(all[Entity::W4], 7);
    assert_eq!(all.unshifted().len(), NUM_UNSHIFTED_ENTITIES);
    assert_eq!(all.shifted()[0], Entity::Table1Shift.index() * 10);
    assert!(AllEntities::try_from_vec(vec![0u8; 3]).is_err());
  }
}
