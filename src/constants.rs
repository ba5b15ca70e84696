pub const DEFAULT_CLAMP_EPS: f64 = 0.025;
pub const DEFAULT_N_BUCKETS: usize = 25;
