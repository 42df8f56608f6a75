use thiserror::Error;

/// Top-level error type for the structure slicer.
#[derive(Debug, Error)]
pub enum SlicerError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
}

/// Errors related to geometric constructions.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("{axis} has norm {norm}, expected a unit vector")]
    NotUnitVector { axis: &'static str, norm: f64 },

    #[error("axes are not orthogonal (dot product = {dot})")]
    NotOrthonormal { dot: f64 },

    #[error("zero-length vector")]
    ZeroVector,

    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Out-of-range values and indices.
#[derive(Debug, Error)]
pub enum RangeError {
    #[error("value {value} is out of range [{min}, {max}]")]
    ValueOutOfRange { value: f64, min: f64, max: f64 },

    #[error("index {index} is out of bounds (size {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    #[error("invalid range [{min}, {max}] with {buckets} buckets")]
    InvalidRange { min: f64, max: f64, buckets: usize },

    #[error("empty interval [{low}, {high})")]
    EmptyInterval { low: usize, high: usize },

    #[error("slice thickness must not be negative (got {0})")]
    NegativeThickness(f64),
}

/// Caller misuse: an operation was invoked in a state that does not support it.
#[derive(Debug, Error)]
pub enum PreconditionError {
    #[error("the accumulator does not retain raw values")]
    ValuesNotStored,

    #[error("median of an empty sample")]
    EmptySample,

    #[error("geometry of slice {0:?} is already known")]
    DuplicateSlice(String),
}

/// Malformed or inconsistent input data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormatError {
    #[error("slice belongs to series {found:?}, expected {expected:?}")]
    MixedSeries { expected: String, found: String },

    #[error("slice {0:?} is not parallel to the other referenced slices")]
    NonParallelSlices(String),

    #[error("{tag} has {found} values, expected {expected}")]
    BadVectorSize {
        tag: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("cannot parse {0:?} as a decimal value")]
    InvalidNumber(String),

    #[error("contour declares {expected} points but carries {found} coordinates")]
    PointCountMismatch { expected: usize, found: usize },

    #[error("missing mandatory tag: {0}")]
    MissingTag(&'static str),

    #[error("coordinate {index} is not finite ({value})")]
    NonFiniteCoordinate { index: usize, value: f64 },
}

/// Internal invariant breaches in the rectangle-union sweep.
#[derive(Debug, Error)]
pub enum ConsistencyError {
    #[error("odd number of endpoints on the sweep stack ({0})")]
    OddEndpointStack(usize),

    #[error("coverage counter underflow on node [{low}, {high})")]
    CounterUnderflow { low: usize, high: usize },

    #[error("unpaired horizontal junction at y = {0}")]
    UnpairedJunction(usize),

    #[error("invalid sweep interval [{low}, {high})")]
    InvalidInterval { low: usize, high: usize },

    #[error("segment tree node not found")]
    UnknownNode,
}

/// Convenience type alias for results using [`SlicerError`].
pub type Result<T> = std::result::Result<T, SlicerError>;
