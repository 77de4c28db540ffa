use rand::rngs::StdRng;
use rand::SeedableRng;
use tandem_nn::{train_loop, Activation, Matrix, Network, TrainConfig, TrainPool};

fn main() {
    env_logger::init();

    let mut rng = StdRng::from_entropy();
    let network = Network::random(
        &[2, 3, 1],
        &[Activation::Sigmoid, Activation::Sigmoid],
        &mut rng,
    )
    .expect("hardcoded shape list is valid");

    let inputs = vec![
        Matrix::from_vec(2, 1, vec![0.0, 0.0]),
        Matrix::from_vec(2, 1, vec![0.0, 1.0]),
        Matrix::from_vec(2, 1, vec![1.0, 0.0]),
        Matrix::from_vec(2, 1, vec![1.0, 1.0]),
    ];
    let targets = vec![
        Matrix::from_vec(1, 1, vec![0.0]),
        Matrix::from_vec(1, 1, vec![1.0]),
        Matrix::from_vec(1, 1, vec![1.0]),
        Matrix::from_vec(1, 1, vec![0.0]),
    ];

    let config = TrainConfig::new(20_000, 2, 2, 0.8);
    let mut pool = TrainPool::new(network, inputs.clone(), targets.clone(), &config)
        .expect("XOR dataset matches the network contract");

    let final_cost = train_loop(&mut pool, &config);
    println!("final cost: {final_cost:.6}");

    let network = pool.into_network();
    for input in &inputs {
        let output = network.feed_forward(input);
        println!(
            "({}, {}) -> {:.4}",
            input.element(0, 0),
            input.element(1, 0),
            output.element(0, 0)
        );
    }
}
