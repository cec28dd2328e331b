use crate::entities::{BoundingBoxQuery, RadiusQuery};

/// Closed box: samples on a face are inside.
pub fn in_bounding_box(query: &BoundingBoxQuery, x: f64, y: f64, z: f64) -> bool {
    (query.min_x..=query.max_x).contains(&x)
        && (query.min_y..=query.max_y).contains(&y)
        && (query.min_z..=query.max_z).contains(&z)
}

pub fn distance(ax: f64, ay: f64, az: f64, bx: f64, by: f64, bz: f64) -> f64 {
    ((ax - bx).powi(2) + (ay - by).powi(2) + (az - bz).powi(2)).sqrt()
}

/// Inclusive boundary.
pub fn in_radius(query: &RadiusQuery, x: f64, y: f64, z: f64) -> bool {
    distance(x, y, z, query.x, query.y, query.z) <= query.radius
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> BoundingBoxQuery {
        BoundingBoxQuery {
            min_x: 0.0,
            max_x: 200.0,
            min_y: 0.0,
            max_y: 100.0,
            min_z: 0.0,
            max_z: 200.0,
            start_date: None,
            end_date: None,
            game_server_id: "gs-1".to_string(),
        }
    }

    fn sphere(radius: f64) -> RadiusQuery {
        RadiusQuery {
            x: 500.0,
            y: 100.0,
            z: 500.0,
            radius,
            start_date: None,
            end_date: None,
            game_server_id: "gs-1".to_string(),
        }
    }

    #[test]
    fn box_bounds_are_closed() {
        let query = unit_box();
        assert!(in_bounding_box(&query, 150.0, 75.0, 150.0));
        assert!(in_bounding_box(&query, 0.0, 100.0, 200.0));
        assert!(!in_bounding_box(&query, 200.1, 50.0, 50.0));
        assert!(!in_bounding_box(&query, 50.0, -0.1, 50.0));
    }

    #[test]
    fn radius_boundary_is_inclusive() {
        assert!(in_radius(&sphere(50.0), 520.0, 100.0, 480.0));
        assert!(in_radius(&sphere(3.0), 503.0, 100.0, 500.0));
        assert!(!in_radius(&sphere(2.999), 503.0, 100.0, 500.0));
    }

    #[test]
    fn distance_is_euclidean() {
        assert_eq!(distance(0.0, 0.0, 0.0, 3.0, 4.0, 12.0), 13.0);
    }
}
