use bevy::prelude::*;

/// Nearest candidate whose planar (x, y) distance to `from` is within
/// `max_radius`, inclusive. Ties keep the first candidate seen.
pub fn find_nearest_in_range(
    from: Vec3,
    max_radius: f32,
    candidates: impl IntoIterator<Item = (Entity, Vec3)>,
) -> Option<(Entity, f32)> {
    let origin = from.truncate();
    let mut nearest: Option<(Entity, f32)> = None;

    for (entity, position) in candidates {
        let distance = origin.distance(position.truncate());
        if distance > max_radius {
            continue;
        }
        if nearest.is_none_or(|(_, best)| distance < best) {
            nearest = Some((entity, distance));
        }
    }

    nearest
}
