use crate::{Dataset, Result, Scalar};

/// A similarity join that reports all pairs within a radius.
pub trait RangeJoin {
    /// Joins ```data``` with itself.
    fn range(&mut self, data: &Dataset, eps: Scalar) -> Result<()>;

    /// Joins every point of ```a``` with the points of ```b```. Pairs are recorded as
    /// ```(id in a, id in b)```.
    fn range_between(&mut self, a: &Dataset, b: &Dataset, eps: Scalar) -> Result<()>;
}

/// A join that reports the ```k``` nearest partners of every point.
pub trait KnnJoin {
    /// Finds the ```k``` nearest neighbours of every point of ```data``` within ```data```.
    fn knn(&mut self, data: &Dataset, k: usize) -> Result<()>;

    /// Finds the ```k``` nearest neighbours in ```b``` of every point of ```a```.
    fn knn_between(&mut self, a: &Dataset, b: &Dataset, k: usize) -> Result<()>;
}
