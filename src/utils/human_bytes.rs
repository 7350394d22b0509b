const STEP: f64 = 1000.0;
const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Formats a byte count in decimal units, e.g. `1000` -> `"1.00 KB"`.
pub fn human_bytes(bytes: u64) -> String {
	let mut number = bytes as f64;
	let mut unit = UNITS[0];

	for candidate in UNITS {
		unit = candidate;
		if number < STEP {
			break;
		}
		if candidate != UNITS[UNITS.len() - 1] {
			number /= STEP;
		}
	}

	format!("{:.2} {}", number, unit)
}
