/// Detects the end of a Lloyd calculation: the assignment of two consecutive iterations is identical.
///
/// Centroid movement is not considered: the centroid update is a deterministic function of the
/// assignment, so an unchanged assignment is a fixed point of the iteration.
#[derive(Debug, Default)]
pub(crate) struct StableAssignment {
    /// Assignment of the previous iteration. `None` before the first iteration.
    previous: Option<Vec<usize>>,
}
impl StableAssignment {
    pub(crate) fn new() -> Self { Self::default() }

    /// Function that has to be called once an iteration calculated a new assignment.
    /// ## Arguments
    /// - **assignments**: The new assignment vector
    /// ## Returns
    /// - **true** if the assignment is identical to the previous one (the calculation converged)
    /// - **false** otherwise, in which case **assignments** becomes the new reference
    pub(crate) fn next(&mut self, assignments: &[usize]) -> bool {
        if self.previous.as_deref() == Some(assignments) {
            return true;
        }
        match self.previous.as_mut() {
            Some(prev) => { prev.clear(); prev.extend_from_slice(assignments); }
            None => self.previous = Some(assignments.to_vec()),
        }
        false
    }

    /// Amount of samples whose assignment differs from the previous iteration.
    /// Every sample counts as changed, if there is no previous iteration.
    pub(crate) fn changed(&self, assignments: &[usize]) -> usize {
        match &self.previous {
            Some(prev) => prev.iter().zip(assignments).filter(|(p, a)| p != a).count(),
            None => assignments.len(),
        }
    }
}
