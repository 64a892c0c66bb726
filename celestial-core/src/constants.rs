#[allow(clippy::excessive_precision)]
#[allow(clippy::approx_constant)]
pub const PI: f64 = 3.141592653589793238462643;

#[allow(clippy::excessive_precision)]
#[allow(clippy::approx_constant)]
pub const HALF_PI: f64 = 1.5707963267948966192313216;

#[allow(clippy::excessive_precision)]
#[allow(clippy::approx_constant)]
pub const TWOPI: f64 = 6.283185307179586476925287;

/// Solid angle of the whole sphere, in steradians.
#[allow(clippy::excessive_precision)]
pub const FOUR_PI: f64 = 12.56637061435917295385057;

#[allow(clippy::excessive_precision)]
pub const DEG_TO_RAD: f64 = 1.745329251994329576923691e-2;

#[allow(clippy::excessive_precision)]
pub const RAD_TO_DEG: f64 = 57.29577951308232087679815;

/// Square degrees per steradian.
#[allow(clippy::excessive_precision)]
pub const SQDEG_PER_SR: f64 = 3282.806350011743794781694;
