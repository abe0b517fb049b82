//! A minimal particle container, holding positions and any number of per-particle scalar
//! attributes which are kept in lockstep with the positions whenever a tree reorders them.
use crate::traits::{tree::ParticleContainer, types::FmmError};

/// Particle positions with attached per-particle values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Particles<T, const D: usize> {
    positions: Vec<[T; D]>,
    attributes: Vec<Vec<T>>,
}

impl<T, const D: usize> Particles<T, D>
where
    T: Copy,
{
    /// Construct a container from particle positions, with no attributes.
    pub fn new(positions: Vec<[T; D]>) -> Self {
        Self {
            positions,
            attributes: Vec::new(),
        }
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the container holds no particles.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Attach a new attribute, returning its id.
    ///
    /// # Arguments
    /// * `values` - One value per particle, in container order.
    pub fn add_attribute(&mut self, values: Vec<T>) -> Result<usize, FmmError> {
        if values.len() != self.len() {
            return Err(FmmError::LengthMismatch {
                expected: self.len(),
                found: values.len(),
            });
        }
        self.attributes.push(values);
        Ok(self.attributes.len() - 1)
    }

    /// Values of an attribute in container order.
    pub fn attribute(&self, id: usize) -> &[T] {
        &self.attributes[id]
    }

    /// Mutable values of an attribute in container order.
    pub fn attribute_mut(&mut self, id: usize) -> &mut [T] {
        &mut self.attributes[id]
    }

    /// Add a particle at the end of the container.
    ///
    /// # Arguments
    /// * `position` - Particle position.
    /// * `values` - One value for each attribute, in attribute id order.
    pub fn push(&mut self, position: [T; D], values: &[T]) -> Result<(), FmmError> {
        if values.len() != self.attributes.len() {
            return Err(FmmError::LengthMismatch {
                expected: self.attributes.len(),
                found: values.len(),
            });
        }
        self.positions.push(position);
        for (attribute, &value) in self.attributes.iter_mut().zip(values) {
            attribute.push(value);
        }
        Ok(())
    }

    /// Remove particles from the end of the container, keeping the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.positions.truncate(len);
        for attribute in self.attributes.iter_mut() {
            attribute.truncate(len);
        }
    }

    /// Move a single particle.
    pub fn set_position(&mut self, index: usize, position: [T; D]) {
        self.positions[index] = position;
    }
}

fn apply_permutation<V: Copy>(values: &mut Vec<V>, permutation: &[usize]) {
    *values = permutation.iter().map(|&i| values[i]).collect();
}

impl<T, const D: usize> ParticleContainer<T, D> for Particles<T, D>
where
    T: Copy,
{
    fn positions(&self) -> &[[T; D]] {
        &self.positions
    }

    fn permute(&mut self, permutation: &[usize]) {
        apply_permutation(&mut self.positions, permutation);
        for attribute in self.attributes.iter_mut() {
            apply_permutation(attribute, permutation);
        }
    }
}

impl<T, const D: usize> ParticleContainer<T, D> for Vec<[T; D]>
where
    T: Copy,
{
    fn positions(&self) -> &[[T; D]] {
        self
    }

    fn permute(&mut self, permutation: &[usize]) {
        apply_permutation(self, permutation);
    }
}
