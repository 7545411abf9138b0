mod delay;

pub use self::delay::Delay;
