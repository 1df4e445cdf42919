//! Fixture files shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::str::FromStr;

use h3load::{Scalar, StoreDir};
use h3o::{CellIndex, LatLng};

pub const CELL1: &str = "8110bffffffffff";
pub const CELL2: &str = "81defffffffffff";

/// Three points in each of two resolution-1 cells.
pub const TWO_CELL_AGG: &str = "\
latitude,longitude,value1,value2
50,50,10,100
50.1,50.1,0,0
50.2,50.2,2,20
-50,-50,10,100
-50.1,-50.1,0,0
-50.2,-50.2,2,20
";

/// Same points, split between two companies.
pub const WITH_COMPANY: &str = "\
company,latitude,longitude,value1,value2
company1,50,50,10,100
company1,50.1,50.1,0,0
company2,50.2,50.2,2,20
company1,-50,-50,10,100
company1,-50.1,-50.1,0,0
company2,-50.2,-50.2,2,20
";

pub fn write_csv(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, body).expect("Failed to write fixture");
    path.to_string_lossy().into_owned()
}

/// Stored rows of `dataset`, in file order.
pub fn read_dataset(database_dir: &Path, dataset: &str) -> Vec<Vec<Scalar>> {
    StoreDir::new(database_dir)
        .read_table(dataset)
        .expect("Failed to read dataset")
        .rows()
}

pub fn centroid(cell: &str) -> (Scalar, Scalar) {
    let cell = CellIndex::from_str(cell).expect("valid cell id");
    let ll = LatLng::from(cell);
    (Scalar::Real(ll.lat()), Scalar::Real(ll.lng()))
}

pub fn real(v: f64) -> Scalar {
    Scalar::Real(v)
}

pub fn int(v: i64) -> Scalar {
    Scalar::Integer(v)
}

pub fn text(v: &str) -> Scalar {
    Scalar::Text(v.to_string())
}
