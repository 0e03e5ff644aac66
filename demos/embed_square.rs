use classical_mds::{ClassicalMds, ClassicalMdsConfig};
use ndarray::array;

fn main() {
    // Squared distances between the corners of a unit square
    let d = array![
        [0.0, 1.0, 2.0, 1.0],
        [1.0, 0.0, 1.0, 2.0],
        [2.0, 1.0, 0.0, 1.0],
        [1.0, 2.0, 1.0, 0.0],
    ];

    let mds = ClassicalMds::new(ClassicalMdsConfig::with_components(2));
    let embedding = mds.fit_array(d).expect("classical MDS failed");

    println!("Coordinates:\n{}", embedding.coordinates());
    println!("Eigenvalues: {}", embedding.eigenvalues());
    println!("Proportion explained: {}", embedding.proportion_explained());
}
