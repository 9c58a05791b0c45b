use std::{
    cmp::Ordering,
    fmt,
    iter::Sum,
    marker::PhantomData,
    ops::{Add, Sub},
};

pub trait DistanceUnit: Copy + Eq {
    const NAME: &'static str;
    const MILLIMETERS_IN_UNIT: i64;
}

/// A length stored as whole millimeters, tagged with the unit it is read in.
#[derive(Debug, Clone, Copy, Eq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct Distance<T: DistanceUnit> {
    mm: i64,
    unit: PhantomData<T>,
}

macro_rules! distance_unit {
    ($unit:ident, $name:expr, $mm:expr) => {
        #[derive(Debug, Copy, Clone, Eq, PartialEq)]
        pub struct $unit;

        impl DistanceUnit for $unit {
            const NAME: &'static str = $name;
            const MILLIMETERS_IN_UNIT: i64 = $mm;
        }
    };
}

distance_unit!(Meters, "meter", 1_000);
distance_unit!(Kilometers, "kilometer", 1_000_000);

impl<T: DistanceUnit> Distance<T> {
    #[inline(always)]
    pub fn value(&self) -> f64 {
        self.mm as f64 / T::MILLIMETERS_IN_UNIT as f64
    }

    pub fn to<U: DistanceUnit>(self) -> Distance<U> {
        Distance {
            mm: self.mm,
            unit: PhantomData,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.mm == 0
    }
}

impl<T: DistanceUnit> Default for Distance<T> {
    fn default() -> Self {
        Distance {
            mm: 0,
            unit: PhantomData,
        }
    }
}

impl<T: DistanceUnit> From<f64> for Distance<T> {
    fn from(value: f64) -> Self {
        Distance {
            mm: (value * T::MILLIMETERS_IN_UNIT as f64).round() as i64,
            unit: PhantomData,
        }
    }
}

impl<T: DistanceUnit> From<Distance<T>> for f64 {
    fn from(value: Distance<T>) -> Self {
        value.value()
    }
}

impl<T: DistanceUnit> fmt::Display for Distance<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = self.value();
        let plural = if value == 1.0 { "" } else { "s" };
        write!(f, "{} {}{}", value, T::NAME, plural)
    }
}

impl<T1: DistanceUnit, T2: DistanceUnit> PartialEq<Distance<T2>> for Distance<T1> {
    fn eq(&self, other: &Distance<T2>) -> bool {
        self.mm == other.mm
    }
}

impl<T1: DistanceUnit, T2: DistanceUnit> PartialOrd<Distance<T2>> for Distance<T1> {
    fn partial_cmp(&self, other: &Distance<T2>) -> Option<Ordering> {
        Some(self.mm.cmp(&other.mm))
    }
}

impl<T: DistanceUnit> Ord for Distance<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.mm.cmp(&other.mm)
    }
}

impl<T1: DistanceUnit, T2: DistanceUnit> Add<Distance<T2>> for Distance<T1> {
    type Output = Distance<T1>;

    fn add(self, other: Distance<T2>) -> Distance<T1> {
        Distance {
            mm: self.mm + other.mm,
            unit: PhantomData,
        }
    }
}

impl<T1: DistanceUnit, T2: DistanceUnit> Sub<Distance<T2>> for Distance<T1> {
    type Output = Distance<T1>;

    fn sub(self, other: Distance<T2>) -> Distance<T1> {
        Distance {
            mm: self.mm - other.mm,
            unit: PhantomData,
        }
    }
}

impl<T: DistanceUnit> Sum for Distance<T> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Distance::default(), |acc, d| acc + d)
    }
}

#[macro_export]
macro_rules! meters {
    ($num:expr) => {
        $crate::distance::Distance::<$crate::distance::Meters>::from(($num) as f64)
    };
}

#[macro_export]
macro_rules! kilometers {
    ($num:expr) => {
        $crate::distance::Distance::<$crate::distance::Kilometers>::from(($num) as f64)
    };
}
