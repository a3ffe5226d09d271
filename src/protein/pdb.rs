//! Backbone dihedrals from PDB structures.
//!
//! Only `ATOM` records are read. Residues are grouped in file order, the
//! backbone is split into polypeptides wherever the chain changes or the
//! C(i)-N(i+1) peptide bond is longer than [`PEPTIDE_BOND_MAX`], and the
//! first polypeptide is converted to a phi/psi matrix. Angles that are not
//! defined (phi of the first residue, psi of the last) are reported as 180.

use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::{
    error::{Error, Result},
    protein::{angles::wrap_degrees, Angles, ProteinState},
};

/// Longest C-N distance (Å) still treated as a peptide bond.
pub const PEPTIDE_BOND_MAX: f64 = 1.8;

const RCSB_DOWNLOAD: &str = "https://files.rcsb.org/download";

type Point = [f64; 3];

#[derive(Debug, Default, Clone)]
struct Backbone {
    chain: char,
    seq: (i32, char),
    n: Option<Point>,
    ca: Option<Point>,
    c: Option<Point>,
}

impl Backbone {
    fn complete(&self) -> Option<(Point, Point, Point)> {
        Some((self.n?, self.ca?, self.c?))
    }
}

/// Download a structure from the RCSB archive and return its first
/// polypeptide as a conformation.
pub fn fetch_protein(pdb_id: &str) -> Result<ProteinState> {
    let url = format!("{RCSB_DOWNLOAD}/{}.pdb", pdb_id.to_uppercase());
    info!("fetching {url}");

    let response = reqwest::blocking::get(&url)?;
    if !response.status().is_success() {
        return Err(Error::Http {
            status: response.status().as_u16(),
            url,
        });
    }
    let text = response.text()?;
    parse_pdb(&text)
}

/// Parse a PDB file from disk.
pub fn load_protein<P: AsRef<Path>>(path: P) -> Result<ProteinState> {
    let text = fs::read_to_string(path.as_ref())?;
    parse_pdb(&text)
}

/// Parse PDB text into a conformation of its first polypeptide.
pub fn parse_pdb(text: &str) -> Result<ProteinState> {
    let residues = read_backbone(text)?;
    let peptide = first_polypeptide(&residues);
    if peptide.is_empty() {
        return Err(Error::pdb("no polypeptide with a complete N/CA/C backbone"));
    }
    debug!("first polypeptide has {} residues", peptide.len());

    let mut phi = Vec::with_capacity(peptide.len());
    let mut psi = Vec::with_capacity(peptide.len());
    for (i, &(n, ca, c)) in peptide.iter().enumerate() {
        let phi_i = if i > 0 {
            let (_, _, prev_c) = peptide[i - 1];
            wrap_degrees(dihedral(prev_c, n, ca, c).to_degrees() as f32)
        } else {
            180.0
        };
        let psi_i = match peptide.get(i + 1) {
            Some(&(next_n, _, _)) => wrap_degrees(dihedral(n, ca, c, next_n).to_degrees() as f32),
            None => 180.0,
        };
        phi.push(phi_i);
        psi.push(psi_i);
    }

    Ok(ProteinState::from_angles(Angles::new(phi, psi)?))
}

fn read_backbone(text: &str) -> Result<Vec<Backbone>> {
    let mut residues: Vec<Backbone> = Vec::new();

    for line in text.lines() {
        if line.starts_with("ENDMDL") {
            // first model only
            break;
        }
        // columns are byte offsets, so only ASCII records can be sliced safely
        if !line.starts_with("ATOM") || line.len() < 54 || !line.is_ascii() {
            continue;
        }
        let altloc = line.as_bytes()[16] as char;
        if altloc != ' ' && altloc != 'A' {
            continue;
        }

        let atom_name = line[12..16].trim();
        let chain = line[21..22].chars().next().unwrap_or(' ');
        let seq_number: i32 = line[22..26]
            .trim()
            .parse()
            .map_err(|_| Error::pdb(format!("bad residue number in '{line}'")))?;
        let insertion = line[26..27].chars().next().unwrap_or(' ');
        let coords = [
            parse_coord(&line[30..38], line)?,
            parse_coord(&line[38..46], line)?,
            parse_coord(&line[46..54], line)?,
        ];

        let key = (seq_number, insertion);
        let is_new = residues
            .last()
            .map_or(true, |r| r.chain != chain || r.seq != key);
        if is_new {
            residues.push(Backbone {
                chain,
                seq: key,
                ..Backbone::default()
            });
        }
        if let Some(residue) = residues.last_mut() {
            match atom_name {
                "N" => residue.n = Some(coords),
                "CA" => residue.ca = Some(coords),
                "C" => residue.c = Some(coords),
                _ => {}
            }
        }
    }

    Ok(residues)
}

fn parse_coord(field: &str, line: &str) -> Result<f64> {
    field
        .trim()
        .parse()
        .map_err(|_| Error::pdb(format!("bad coordinate in '{line}'")))
}

fn first_polypeptide(residues: &[Backbone]) -> Vec<(Point, Point, Point)> {
    let mut peptide: Vec<(Point, Point, Point)> = Vec::new();
    let mut chain = None;

    for residue in residues {
        let Some(atoms) = residue.complete() else {
            if peptide.is_empty() {
                continue;
            }
            break;
        };
        if let Some(&(_, _, prev_c)) = peptide.last() {
            let bonded = chain == Some(residue.chain) && distance(prev_c, atoms.0) <= PEPTIDE_BOND_MAX;
            if !bonded {
                break;
            }
        }
        chain = Some(residue.chain);
        peptide.push(atoms);
    }

    peptide
}

fn sub(a: Point, b: Point) -> Point {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: Point, b: Point) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: Point, b: Point) -> Point {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn distance(a: Point, b: Point) -> f64 {
    let d = sub(a, b);
    dot(d, d).sqrt()
}

/// Signed dihedral angle p0-p1-p2-p3 in radians, in `(-pi, pi]`.
fn dihedral(p0: Point, p1: Point, p2: Point, p3: Point) -> f64 {
    let b0 = sub(p0, p1);
    let b1 = sub(p2, p1);
    let b2 = sub(p3, p2);

    let b1_len = dot(b1, b1).sqrt();
    let b1n = [b1[0] / b1_len, b1[1] / b1_len, b1[2] / b1_len];

    let v = sub(b0, scale(b1n, dot(b0, b1n)));
    let w = sub(b2, scale(b1n, dot(b2, b1n)));

    let x = dot(v, w);
    let y = dot(cross(b1n, v), w);
    y.atan2(x)
}

fn scale(a: Point, s: f64) -> Point {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(serial: usize, name: &str, res: &str, chain: char, seq: i32, p: Point) -> String {
        format!(
            "ATOM  {serial:>5} {name:<4} {res:>3} {chain}{seq:>4}    {:>8.3}{:>8.3}{:>8.3}  1.00  0.00           {}",
            p[0],
            p[1],
            p[2],
            &name[..1]
        )
    }

    #[test]
    fn test_dihedral_reference_geometry() {
        let p0 = [1.0, 0.0, 0.0];
        let p1 = [0.0, 0.0, 0.0];
        let p2 = [0.0, 1.0, 0.0];

        let gauche = dihedral(p0, p1, p2, [0.0, 1.0, 1.0]).to_degrees();
        assert!((gauche + 90.0).abs() < 1e-9, "got {gauche}");

        let anti = dihedral(p0, p1, p2, [-1.0, 1.0, 0.0]).to_degrees();
        assert!((anti.abs() - 180.0).abs() < 1e-9, "got {anti}");

        let cis = dihedral(p0, p1, p2, [1.0, 1.0, 0.0]).to_degrees();
        assert!(cis.abs() < 1e-9, "got {cis}");
    }

    #[test]
    fn test_parse_three_residue_peptide() {
        // zig-zag backbone with 1.33 Å peptide bonds
        let coords: Vec<[Point; 3]> = vec![
            [[0.0, 0.0, 0.0], [1.46, 0.0, 0.0], [2.0, 1.4, 0.0]],
            [[3.3, 1.5, 0.0], [4.0, 2.8, 0.5], [5.5, 2.8, 0.2]],
            [[6.2, 3.9, 0.0], [7.6, 3.9, 0.4], [8.2, 5.2, 0.1]],
        ];
        let mut text = String::from("HEADER    TEST\n");
        let mut serial = 1;
        for (i, residue) in coords.iter().enumerate() {
            for (name, p) in ["N", "CA", "C"].iter().zip(residue.iter()) {
                text.push_str(&atom(serial, name, "ALA", 'A', i as i32 + 1, *p));
                text.push('\n');
                serial += 1;
            }
        }
        text.push_str("END\n");

        let state = parse_pdb(&text).unwrap();
        assert_eq!(state.n_residues(), 3);

        let angles = state.angles();
        assert_eq!(angles.phi()[0], 180.0);
        assert_eq!(angles.psi()[2], 180.0);

        let expected_psi0 =
            wrap_degrees(dihedral(coords[0][0], coords[0][1], coords[0][2], coords[1][0]).to_degrees() as f32);
        let expected_phi1 =
            wrap_degrees(dihedral(coords[0][2], coords[1][0], coords[1][1], coords[1][2]).to_degrees() as f32);
        assert!((angles.psi()[0] - expected_psi0).abs() < 1e-3);
        assert!((angles.phi()[1] - expected_phi1).abs() < 1e-3);
        assert!(angles.flatten().iter().all(|&v| (0.0..360.0).contains(&v)));
    }

    #[test]
    fn test_chain_break_ends_first_polypeptide() {
        let mut text = String::new();
        // residue 1 and 2 bonded, residue 3 far away
        let residues = [
            [[0.0, 0.0, 0.0], [1.46, 0.0, 0.0], [2.0, 1.4, 0.0]],
            [[3.3, 1.5, 0.0], [4.0, 2.8, 0.5], [5.5, 2.8, 0.2]],
            [[30.0, 0.0, 0.0], [31.4, 0.0, 0.0], [32.0, 1.4, 0.0]],
        ];
        for (i, residue) in residues.iter().enumerate() {
            for (name, p) in ["N", "CA", "C"].iter().zip(residue.iter()) {
                text.push_str(&atom(i * 3 + 1, name, "GLY", 'A', i as i32 + 1, *p));
                text.push('\n');
            }
        }
        let state = parse_pdb(&text).unwrap();
        assert_eq!(state.n_residues(), 2);
    }

    #[test]
    fn test_non_ascii_record_is_skipped() {
        let residue = [[0.0, 0.0, 0.0], [1.46, 0.0, 0.0], [2.0, 1.4, 0.0]];
        let mut text = String::new();
        for (serial, (name, p)) in ["N", "CA", "C"].iter().zip(residue.iter()).enumerate() {
            text.push_str(&atom(serial + 1, name, "ALA", 'A', 1, *p));
            text.push('\n');
        }
        // a two-byte character straddling the end of the atom-name columns
        let mut garbled = atom(4, "O", "ALA", 'A', 1, [2.5, 2.4, 0.0]);
        garbled.replace_range(15..16, "é");
        text.push_str(&garbled);
        text.push('\n');

        let state = parse_pdb(&text).unwrap();
        assert_eq!(state.n_residues(), 1);
    }

    #[test]
    fn test_no_backbone_is_error() {
        let text = "HETATM    1  O   HOH A   1       0.000   0.000   0.000  1.00  0.00           O\n";
        assert!(matches!(parse_pdb(text), Err(Error::Pdb(_))));
    }
}
