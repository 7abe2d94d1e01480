use serde::{Serialize, Deserialize};

/// A product or resource version of up to 4 numeric segments.
///
/// Missing segments are zero. Comparison is segment wise so `1.2.10.0` is newer than `1.2.4.0`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
	segments: [u32; 4],
}

impl Version {
	pub fn new(version: &str) -> crate::Result<Self> {
		let spl: Vec<&str> = version.trim().split('.').collect();
		if spl.len() > 4 {
			return Err(crate::Error::Parse(format!("version has more than 4 segments: {}", version)));
		}
		let mut segments = [0u32; 4];
		for (i, s) in spl.iter().enumerate() {
			segments[i] = s.parse::<u32>()
				.map_err(|_| crate::Error::Parse(format!("version segment is not a number: {}", version)))?;
		}
		Ok(Version { segments })
	}

	/// Whether both versions sit in the same `major.minor.micro` stream, ignoring the last segment.
	pub fn same_stream(&self, other: &Version) -> bool {
		self.segments[..3] == other.segments[..3]
	}
}

impl TryFrom<&str> for Version {
	type Error = crate::Error;
	fn try_from(value: &str) -> Result<Self, Self::Error> { Self::new(value) }
}

impl std::fmt::Display for Version {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}.{}.{}.{}", self.segments[0], self.segments[1], self.segments[2], self.segments[3])
	}
}

/// A range of acceptable product versions from an applies-to filter.
///
/// Three written forms are accepted: an exact version `8.5.5.2`, an unbounded
/// range `8.5.5.2+` and an inclusive bounded range `[8.5.5.2, 8.5.5.4]`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionRange {
	#[default]
	Any,
	Exact(Version),
	MinOnly(Version),
	MinMax(Version, Version),
}

impl VersionRange {
	pub fn new(expression: &str) -> crate::Result<Self> {
		let expression = expression.trim();
		if expression.is_empty() {
			return Ok(VersionRange::Any);
		}
		if let Some(inner) = expression.strip_prefix('[') {
			let inner = inner.strip_suffix(']')
				.ok_or_else(|| crate::Error::Parse(format!("version range is missing a closing bracket: {}", expression)))?;
			let spl: Vec<&str> = inner.split(',').collect();
			if spl.len() != 2 {
				return Err(crate::Error::Parse(format!("version range must have 2 versions: {}", expression)));
			}
			Ok(VersionRange::MinMax(Version::new(spl[0])?, Version::new(spl[1])?))
		} else if let Some(min) = expression.strip_suffix('+') {
			Ok(VersionRange::MinOnly(Version::new(min)?))
		} else {
			Ok(VersionRange::Exact(Version::new(expression)?))
		}
	}

	pub fn is_version_within(&self, version: &Version) -> bool {
		match self {
			VersionRange::Any => true,
			VersionRange::Exact(v) => version == v,
			VersionRange::MinOnly(min) => version >= min,
			VersionRange::MinMax(min, max) => version >= min && version <= max,
		}
	}

	/// The lowest version able to satisfy the range, `None` for an unconstrained range.
	pub fn minimum(&self) -> Option<&Version> {
		match self {
			VersionRange::Any => None,
			VersionRange::Exact(v) => Some(v),
			VersionRange::MinOnly(min) => Some(min),
			VersionRange::MinMax(min, _) => Some(min),
		}
	}

	/// The highest version able to satisfy the range, `None` when unbounded above.
	pub fn maximum(&self) -> Option<&Version> {
		match self {
			VersionRange::Any | VersionRange::MinOnly(_) => None,
			VersionRange::Exact(v) => Some(v),
			VersionRange::MinMax(_, max) => Some(max),
		}
	}
}

impl std::fmt::Display for VersionRange {
	/* An exact version renders as a one version wide range and an unbounded
	 * range as its bare minimum, matching how missing products are reported. */
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			VersionRange::Any => write!(f, "0.0.0.0"),
			VersionRange::Exact(v) => write!(f, "[{}, {}]", v, v),
			VersionRange::MinOnly(min) => write!(f, "{}", min),
			VersionRange::MinMax(min, max) => write!(f, "[{}, {}]", min, max),
		}
	}
}
