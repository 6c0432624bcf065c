use aiglet::balance::{balance, BalanceOptions};
use aiglet::literal::Lit;
use aiglet::refactor::{refactor, RefactorOptions};
use aiglet::rewrite::{rewrite, RewriteOptions};
use aiglet::store::AigStore;

fn xor_tree(depth: usize) -> AigStore {
    let mut s = AigStore::new(1 << (depth + 2));
    let mut frontier: Vec<Lit> = (0..(1usize << depth)).map(|_| s.create_pi().unwrap()).collect();
    while frontier.len() > 1 {
        let mut next = Vec::with_capacity(frontier.len() / 2);
        for pair in frontier.chunks(2) {
            let (x, y) = (pair[0], pair[1]);
            let n1 = s.and(x, y.not()).unwrap();
            let n2 = s.and(x.not(), y).unwrap();
            next.push(s.and(n1.not(), n2.not()).unwrap().not());
        }
        frontier = next;
    }
    s.create_po(frontier[0]).unwrap();
    s
}

#[divan::bench(args = [4, 6, 8])]
fn bench_balance(bencher: divan::Bencher, depth: usize) {
    bencher
        .with_inputs(|| xor_tree(depth))
        .bench_values(|mut s| balance(&mut s, &BalanceOptions::default()).unwrap());
}

#[divan::bench(args = [4, 6, 8])]
fn bench_rewrite(bencher: divan::Bencher, depth: usize) {
    bencher
        .with_inputs(|| xor_tree(depth))
        .bench_values(|mut s| rewrite(&mut s, &RewriteOptions::default()).unwrap());
}

#[divan::bench(args = [4, 6])]
fn bench_refactor(bencher: divan::Bencher, depth: usize) {
    bencher
        .with_inputs(|| xor_tree(depth))
        .bench_values(|mut s| refactor(&mut s, &RefactorOptions::default()).unwrap());
}

fn main() {
    divan::main();
}
