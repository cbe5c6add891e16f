use std::collections::HashSet;
use std::io::BufRead;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::{JoinError, Label, PointId, Result, Scalar};

/// A single feature vector with its identity and an optional ground-truth label.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    /// Identity, unique within a dataset.
    pub id: PointId,
    /// Feature values.
    pub values: Array1<Scalar>,
    /// Class label, only used for evaluation.
    pub label: Option<Label>,
}

impl Point {
    /// Creates an unlabelled point.
    pub fn new(id: PointId, values: Array1<Scalar>) -> Self {
        Self {
            id,
            values,
            label: None,
        }
    }

    /// Attaches a label to the point.
    pub fn with_label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }
}

/// An ordered collection of points sharing the same dimensionality.
///
/// Feature values are stored row-major in one matrix; row `i` belongs to the point with id
/// `ids()[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    ids: Vec<PointId>,
    labels: Vec<Option<Label>>,
    values: Array2<Scalar>,
}

impl Dataset {
    /// Builds a dataset from points. Fails if the points disagree on dimensionality or share
    /// an id.
    pub fn new(points: Vec<Point>) -> Result<Self> {
        let ncols = points.first().map_or(0, |p| p.values.len());
        let mut ids = Vec::with_capacity(points.len());
        let mut labels = Vec::with_capacity(points.len());
        let mut flat = Vec::with_capacity(points.len() * ncols);
        let mut seen = HashSet::with_capacity(points.len());

        for p in points {
            if p.values.len() != ncols {
                return Err(JoinError::InvalidArgument(format!(
                    "point {} has {} values, expected {}",
                    p.id,
                    p.values.len(),
                    ncols
                )));
            }

            if !seen.insert(p.id) {
                return Err(JoinError::InvalidArgument(format!(
                    "duplicate point id {}",
                    p.id
                )));
            }

            ids.push(p.id);
            labels.push(p.label);
            flat.extend(p.values.iter().copied());
        }

        let values = Array2::from_shape_vec((ids.len(), ncols), flat)
            .map_err(|e| JoinError::InvalidArgument(e.to_string()))?;

        Ok(Self {
            ids,
            labels,
            values,
        })
    }

    /// Wraps a matrix, one point per row, with ids `0..nrows`.
    pub fn from_array(values: Array2<Scalar>) -> Self {
        let n = values.nrows();
        Self {
            ids: (0..n).collect(),
            labels: vec![None; n],
            values,
        }
    }

    /// Reads delimited text, one point per line.
    ///
    /// If `label_col` is given, that column is parsed as an integer label and removed from the
    /// features. Ids are assigned in line order starting at zero. Blank lines are skipped.
    pub fn read_delimited<R: BufRead>(
        reader: R,
        sep: char,
        label_col: Option<usize>,
        has_header: bool,
    ) -> Result<Self> {
        let mut points = Vec::new();
        let mut ncols = None;

        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if (has_header && lineno == 0) || line.trim().is_empty() {
                continue;
            }

            let parse_err = |message: String| JoinError::Parse {
                line: lineno + 1,
                message,
            };

            let mut label = None;
            let mut values = Vec::new();
            for (col, field) in line.split(sep).enumerate() {
                let field = field.trim();
                if Some(col) == label_col {
                    let v = field
                        .parse::<Label>()
                        .map_err(|e| parse_err(format!("label '{}': {}", field, e)))?;
                    label = Some(v);
                } else {
                    let v = field
                        .parse::<Scalar>()
                        .map_err(|e| parse_err(format!("value '{}': {}", field, e)))?;
                    values.push(v);
                }
            }

            match ncols {
                Some(n) if n != values.len() => {
                    return Err(parse_err(format!(
                        "expected {} values, found {}",
                        n,
                        values.len()
                    )));
                }
                Some(_) => {}
                None => ncols = Some(values.len()),
            }

            let mut point = Point::new(points.len(), Array1::from(values));
            point.label = label;
            points.push(point);
        }

        Self::new(points)
    }

    /// Returns the number of points.
    pub fn num_rows(&self) -> usize {
        self.values.nrows()
    }

    /// Returns the dimensionality of every point.
    pub fn num_cols(&self) -> usize {
        self.values.ncols()
    }

    /// Returns ```true``` if the dataset has no points.
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Returns the id of the point in row ```idx```.
    pub fn id(&self, idx: usize) -> PointId {
        self.ids[idx]
    }

    /// Returns the feature vector in row ```idx```.
    pub fn row(&self, idx: usize) -> ArrayView1<'_, Scalar> {
        self.values.row(idx)
    }

    /// Returns the label of the point in row ```idx```.
    pub fn label(&self, idx: usize) -> Option<Label> {
        self.labels[idx]
    }

    /// Returns an owned copy of the point in row ```idx```.
    pub fn point(&self, idx: usize) -> Point {
        Point {
            id: self.ids[idx],
            values: self.values.row(idx).to_owned(),
            label: self.labels[idx],
        }
    }

    /// Returns all ids in row order.
    pub fn ids(&self) -> &[PointId] {
        &self.ids
    }

    /// Returns all labels in row order.
    pub fn labels(&self) -> &[Option<Label>] {
        &self.labels
    }

    /// Returns the feature matrix.
    pub fn values(&self) -> ArrayView2<'_, Scalar> {
        self.values.view()
    }

    /// Iterates over ```(id, values)``` in row order.
    pub fn iter(&self) -> impl Iterator<Item = (PointId, ArrayView1<'_, Scalar>)> + '_ {
        self.ids.iter().copied().zip(self.values.outer_iter())
    }

    /// Rewrites every feature vector so that new column ```j``` holds old column ```order[j]```.
    ///
    /// # Panics
    ///
    /// Panics if ```order``` contains an index out of bounds.
    pub fn permute_columns(&mut self, order: &[usize]) {
        self.values = self.values.select(Axis(1), order);
    }

    /// Min-max scales every column into ```[0, 1]```. Constant columns become zero.
    pub fn normalize(&mut self) {
        for mut col in self.values.columns_mut() {
            let (lo, hi) = col
                .iter()
                .fold((Scalar::INFINITY, Scalar::NEG_INFINITY), |(lo, hi), &x| {
                    (lo.min(x), hi.max(x))
                });
            let span = hi - lo;

            if span > 0. {
                col.mapv_inplace(|x| (x - lo) / span);
            } else {
                col.fill(0.);
            }
        }
    }

    /// Returns a copy whose row ```i``` is row ```order[i]``` of ```self```.
    pub(crate) fn select_rows(&self, order: &[usize]) -> Self {
        Self {
            ids: order.iter().map(|&i| self.ids[i]).collect(),
            labels: order.iter().map(|&i| self.labels[i]).collect(),
            values: self.values.select(Axis(0), order),
        }
    }
}
