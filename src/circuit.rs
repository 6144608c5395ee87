//! A minimal Ultra circuit builder.
//!
//! Variables are field elements identified by index. Copy constraints between variables are
//! tracked with a union-find forest; every gate reads four variables (one per wire) and
//! carries its own selector values. Lookup gates read three variables that must form an
//! entry of a registered lookup table.
use crate::errors::HonkError;
use ff::PrimeField;

/// Index of a circuit variable
pub type Variable = u32;

/// Selector values of one trace row
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selectors<F: PrimeField> {
  /// Multiplication selector, scales `w_1 * w_2`
  pub q_m: F,
  /// Scales `w_1`
  pub q_l: F,
  /// Scales `w_2`
  pub q_r: F,
  /// Scales `w_3`
  pub q_o: F,
  /// Scales `w_4`
  pub q_4: F,
  /// Constant term, or the table id on lookup rows
  pub q_c: F,
  /// Enables the arithmetic relation
  pub q_arith: F,
  /// Enables the lookup relation
  pub q_lookup: F,
}

impl<F: PrimeField> Default for Selectors<F> {
  fn default() -> Self {
    Self {
      q_m: F::ZERO,
      q_l: F::ZERO,
      q_r: F::ZERO,
      q_o: F::ZERO,
      q_4: F::ZERO,
      q_c: F::ZERO,
      q_arith: F::ZERO,
      q_lookup: F::ZERO,
    }
  }
}

/// One gate: the variables on its four wires and its selectors
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gate<F: PrimeField> {
  /// Variables read by `w_1..w_4`
  pub wires: [Variable; 4],
  /// Selector values
  pub selectors: Selectors<F>,
  /// The table read by a lookup gate
  pub table_id: Option<u64>,
}

/// Coefficients of a general arithmetic gate
/// `q_m a b + q_l a + q_r b + q_o c + q_4 d + q_c = 0`
#[derive(Clone, Debug)]
pub struct PolyGate<F: PrimeField> {
  /// Variables `a, b, c, d`
  pub wires: [Variable; 4],
  /// `q_m`
  pub q_m: F,
  /// `q_l`
  pub q_l: F,
  /// `q_r`
  pub q_r: F,
  /// `q_o`
  pub q_o: F,
  /// `q_4`
  pub q_4: F,
  /// `q_c`
  pub q_c: F,
}

/// A table of three-column entries, addressed by a nonzero id
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupTable<F: PrimeField> {
  /// Table id, written to the fourth table column and to `q_c` of lookup rows
  pub id: u64,
  /// Entries in table order
  pub entries: Vec<[F; 3]>,
}

/// An Ultra circuit together with its variable assignment
#[derive(Clone, Debug)]
pub struct UltraCircuit<F: PrimeField> {
  pub(crate) variables: Vec<F>,
  parents: Vec<Variable>,
  pub(crate) public_inputs: Vec<Variable>,
  pub(crate) gates: Vec<Gate<F>>,
  pub(crate) lookup_tables: Vec<LookupTable<F>>,
  zero_idx: Variable,
}

impl<F: PrimeField> Default for UltraCircuit<F> {
  fn default() -> Self {
    Self::new()
  }
}

impl<F: PrimeField> UltraCircuit<F> {
  /// Creates a circuit holding a single variable constrained to zero
  pub fn new() -> Self {
    let mut circuit = Self {
      variables: Vec::new(),
      parents: Vec::new(),
      public_inputs: Vec::new(),
      gates: Vec::new(),
      lookup_tables: Vec::new(),
      zero_idx: 0,
    };
    let zero = circuit.add_variable(F::ZERO);
    circuit.zero_idx = zero;
    circuit.gates.push(Gate {
      wires: [zero; 4],
      selectors: Selectors {
        q_l: F::ONE,
        q_arith: F::ONE,
        ..Default::default()
      },
      table_id: None,
    });
    circuit
  }

  /// The variable constrained to zero, used to fill unused wires
  pub fn zero_idx(&self) -> Variable {
    self.zero_idx
  }

  /// Adds a private variable with the given value
  pub fn add_variable(&mut self, value: F) -> Variable {
    let idx = self.variables.len() as Variable;
    self.variables.push(value);
    self.parents.push(idx);
    idx
  }

  /// Adds a public input variable with the given value
  pub fn add_public_input(&mut self, value: F) -> Variable {
    let idx = self.add_variable(value);
    self.public_inputs.push(idx);
    idx
  }

  /// Number of variables
  pub fn num_variables(&self) -> usize {
    self.variables.len()
  }

  /// Number of gates, the zero gate included
  pub fn num_gates(&self) -> usize {
    self.gates.len()
  }

  /// Number of public inputs
  pub fn num_public_inputs(&self) -> usize {
    self.public_inputs.len()
  }

  /// Number of lookup gates
  pub fn num_lookups(&self) -> usize {
    self
      .gates
      .iter()
      .filter(|g| g.table_id.is_some())
      .count()
  }

  /// Total number of entries across all lookup tables
  pub fn num_table_entries(&self) -> usize {
    self.lookup_tables.iter().map(|t| t.entries.len()).sum()
  }

  /// Current value of a variable
  pub fn get_variable(&self, idx: Variable) -> Result<F, HonkError> {
    self
      .variables
      .get(idx as usize)
      .copied()
      .ok_or(HonkError::InvalidIndex)
  }

  /// Values of the public inputs, in the order they were added
  pub fn public_input_values(&self) -> Vec<F> {
    self
      .public_inputs
      .iter()
      .map(|i| self.variables[*i as usize])
      .collect()
  }

  /// Representative of the copy class of `idx`
  pub(crate) fn real_variable_index(&self, mut idx: Variable) -> Variable {
    while self.parents[idx as usize] != idx {
      idx = self.parents[idx as usize];
    }
    idx
  }

  fn check_variable(&self, idx: Variable) -> Result<(), HonkError> {
    if (idx as usize) < self.variables.len() {
      Ok(())
    } else {
      Err(HonkError::InvalidIndex)
    }
  }

  /// Constrains two variables to be equal
  pub fn assert_equal(&mut self, a: Variable, b: Variable) -> Result<(), HonkError> {
    self.check_variable(a)?;
    self.check_variable(b)?;
    if self.variables[a as usize] != self.variables[b as usize] {
      return Err(HonkError::UnSat {
        reason: format!("assert_equal on variables {a} and {b} with different values"),
      });
    }
    let (ra, rb) = (self.real_variable_index(a), self.real_variable_index(b));
    if ra != rb {
      self.parents[rb as usize] = ra;
    }
    Ok(())
  }

  /// Adds `q_m a b + q_l a + q_r b + q_o c + q_4 d + q_c = 0`
  pub fn create_poly_gate(&mut self, gate: PolyGate<F>) -> Result<(), HonkError> {
    for w in gate.wires {
      self.check_variable(w)?;
    }
    self.gates.push(Gate {
      wires: gate.wires,
      selectors: Selectors {
        q_m: gate.q_m,
        q_l: gate.q_l,
        q_r: gate.q_r,
        q_o: gate.q_o,
        q_4: gate.q_4,
        q_c: gate.q_c,
        q_arith: F::ONE,
        q_lookup: F::ZERO,
      },
      table_id: None,
    });
    Ok(())
  }

  /// Adds `q_l a + q_r b + q_o c + q_c = 0`
  pub fn create_add_gate(
    &mut self,
    wires: [Variable; 3],
    scaling: [F; 3],
    constant: F,
  ) -> Result<(), HonkError> {
    self.create_poly_gate(PolyGate {
      wires: [wires[0], wires[1], wires[2], self.zero_idx],
      q_m: F::ZERO,
      q_l: scaling[0],
      q_r: scaling[1],
      q_o: scaling[2],
      q_4: F::ZERO,
      q_c: constant,
    })
  }

  /// Adds `a b = c`
  pub fn create_mul_gate(&mut self, a: Variable, b: Variable, c: Variable) -> Result<(), HonkError> {
    self.create_poly_gate(PolyGate {
      wires: [a, b, c, self.zero_idx],
      q_m: F::ONE,
      q_l: F::ZERO,
      q_r: F::ZERO,
      q_o: -F::ONE,
      q_4: F::ZERO,
      q_c: F::ZERO,
    })
  }

  /// Registers a lookup table and returns its id. Ids start at 1.
  pub fn add_lookup_table(&mut self, entries: Vec<[F; 3]>) -> Result<u64, HonkError> {
    if entries.is_empty() {
      return Err(HonkError::InvalidInputLength);
    }
    let id = self.lookup_tables.len() as u64 + 1;
    self.lookup_tables.push(LookupTable { id, entries });
    Ok(id)
  }

  pub(crate) fn lookup_table(&self, id: u64) -> Result<&LookupTable<F>, HonkError> {
    id.checked_sub(1)
      .and_then(|i| self.lookup_tables.get(i as usize))
      .ok_or_else(|| HonkError::InvalidLookup {
        reason: format!("no lookup table with id {id}"),
      })
  }

  /// Adds a gate reading `(a, b, c)` from table `table_id`
  pub fn create_lookup_gate(&mut self, table_id: u64, wires: [Variable; 3]) -> Result<(), HonkError> {
    self.lookup_table(table_id)?;
    for w in wires {
      self.check_variable(w)?;
    }
    self.gates.push(Gate {
      wires: [wires[0], wires[1], wires[2], self.zero_idx],
      selectors: Selectors {
        q_c: F::from(table_id),
        q_lookup: F::ONE,
        ..Default::default()
      },
      table_id: Some(table_id),
    });
    Ok(())
  }

  /// Values read by a gate's wires
  pub(crate) fn wire_values(&self, gate: &Gate<F>) -> [F; 4] {
    gate.wires.map(|w| self.variables[w as usize])
  }

  /// Index of the entry a lookup gate reads, within its table
  pub(crate) fn lookup_entry_index(&self, gate: &Gate<F>) -> Result<(u64, usize), HonkError> {
    let id = gate.table_id.ok_or(HonkError::InvalidIndex)?;
    let table = self.lookup_table(id)?;
    let [a, b, c, _] = self.wire_values(gate);
    table
      .entries
      .iter()
      .position(|e| *e == [a, b, c])
      .map(|i| (id, i))
      .ok_or_else(|| HonkError::InvalidLookup {
        reason: format!("value not present in lookup table {id}"),
      })
  }

  /// Checks every gate against the current assignment
  pub fn check_circuit(&self) -> Result<(), HonkError> {
    for (i, gate) in self.gates.iter().enumerate() {
      let s = &gate.selectors;
      if gate.table_id.is_some() {
        self.lookup_entry_index(gate)?;
        continue;
      }
      let [a, b, c, d] = self.wire_values(gate);
      let value = s.q_m * a * b + s.q_l * a + s.q_r * b + s.q_o * c + s.q_4 * d + s.q_c;
      if s.q_arith * value != F::ZERO {
        return Err(HonkError::UnSat {
          reason: format!("arithmetic gate {i} is not satisfied"),
        });
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::provider::bn256::bn256;
  use ff::Field;

  type F = bn256::Scalar;

  #[test]
  fn test_cubic_circuit() {
    // x^3 + x + 5 = y with x = 3
    let mut circuit = UltraCircuit::<F>::new();
    let x = circuit.add_variable(F::from(3u64));
    let y = circuit.add_public_input(F::from(35u64));
    let x_sq = circuit.add_variable(F::from(9u64));
    let x_cu = circuit.add_variable(F::from(27u64));
    circuit.create_mul_gate(x, x, x_sq).unwrap();
    circuit.create_mul_gate(x_sq, x, x_cu).unwrap();
    circuit
      .create_add_gate([x_cu, x, y], [F::ONE, F::ONE, -F::ONE], F::from(5u64))
      .unwrap();

    assert_eq!(circuit.num_gates(), 4);
    assert_eq!(circuit.public_input_values(), vec![F::from(35u64)]);
    assert!(circuit.check_circuit().is_ok());

    circuit.variables[y as usize] = F::from(36u64);
    assert!(matches!(
      circuit.check_circuit(),
      Err(HonkError::UnSat { .. })
    ));
  }

  #[test]
  fn test_copy_constraints() {
    let mut circuit = UltraCircuit::<F>::new();
    let a = circuit.add_variable(F::from(4u64));
    let b = circuit.add_variable(F::from(4u64));
    let c = circuit.add_variable(F::from(4u64));
    let d = circuit.add_variable(F::from(5u64));
    circuit.assert_equal(a, b).unwrap();
    circuit.assert_equal(c, b).unwrap();
    assert_eq!(circuit.real_variable_index(b), circuit.real_variable_index(c));
    assert_eq!(circuit.real_variable_index(a), circuit.real_variable_index(c));
    assert!(matches!(
      circuit.assert_equal(a, d),
      Err(HonkError::UnSat { .. })
    ));
    assert_eq!(circuit.assert_equal(a, 99), Err(HonkError::InvalidIndex));
  }

  #[test]
  fn test_lookup_gates() {
    let mut circuit = UltraCircuit::<F>::new();
    let xor = (0..4u64)
      .flat_map(|a| (0..4u64).map(move |b| [F::from(a), F::from(b), F::from(a ^ b)]))
      .collect::<Vec<_>>();
    let id = circuit.add_lookup_table(xor).unwrap();
    assert_eq!(id, 1);

    let a = circuit.add_variable(F::from(2u64));
    let b = circuit.add_variable(F::from(3u64));
    let c = circuit.add_variable(F::from(1u64));
    circuit.create_lookup_gate(id, [a, b, c]).unwrap();
    assert_eq!(circuit.num_lookups(), 1);
    assert!(circuit.check_circuit().is_ok());
    assert_eq!(
      circuit.lookup_entry_index(&circuit.gates[1]).unwrap(),
      (1, 2 * 4 + 3)
    );

    let bad = circuit.add_variable(F::from(2u64));
    circuit.create_lookup_gate(id, [a, b, bad]).unwrap();
    assert!(matches!(
      circuit.check_circuit(),
      Err(HonkError::InvalidLookup { .. })
    ));
    assert!(matches!(
      circuit.create_lookup_gate(7, [a, b, c]),
      Err(HonkError::InvalidLookup { .. })
    ));
  }
}
