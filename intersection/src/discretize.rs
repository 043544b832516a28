use anyhow::Result;

use geom::{Distance, PolyLine};
use lanelet_map::{LaneletID, LaneletMap};

/// A lanelet sliced into cross-sections, upstream to downstream. Each one runs from the left
/// boundary to the right boundary.
#[derive(Clone, Debug)]
pub struct DiscretizedLane {
    pub lane_id: LaneletID,
    pub divisions: Vec<PolyLine>,
}

/// Slices every straight detection lanelet into cross-sections `resolution` apart, with points
/// every `resolution` along each cross-section. Turning lanelets are skipped, and the rest come
/// back upstream first.
pub fn generate_detection_lane_divisions(
    detection_lanelets: &[LaneletID],
    map: &LaneletMap,
    resolution: Distance,
) -> Result<Vec<DiscretizedLane>> {
    if resolution <= Distance::ZERO {
        bail!("Can't discretize lanes with resolution {}", resolution);
    }

    let mut straight = Vec::new();
    for id in detection_lanelets {
        let lanelet = map
            .maybe_get_l(*id)
            .ok_or_else(|| anyhow!("detection lanelet {} isn't in the map", id))?;
        if lanelet.is_turning() {
            continue;
        }
        straight.push(*id);
    }

    let mut result = Vec::new();
    for id in map.routing().upstream_first(&straight) {
        let lanelet = map.get_l(id);
        let mut divisions = Vec::new();
        for dist in lanelet.centerline.step_distances(resolution) {
            let (left, right) = lanelet.cross_section_at(dist)?;
            let width = left.dist_to(right);
            if width < geom::EPSILON_DIST {
                warn!("{} has no width {} along; skipping that cross-section", id, dist);
                continue;
            }
            let steps = ((width / resolution).ceil() as usize).max(1);
            let pts = (0..=steps)
                .map(|i| left.lerp(right, (i as f64) / (steps as f64)))
                .collect();
            divisions.push(PolyLine::deduping_new(pts)?);
        }
        if divisions.len() < 2 {
            bail!(
                "{} only has {} cross-sections at resolution {}",
                id,
                divisions.len(),
                resolution
            );
        }
        result.push(DiscretizedLane {
            lane_id: id,
            divisions,
        });
    }
    Ok(result)
}
