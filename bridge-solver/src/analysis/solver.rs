//! Global stiffness assembly, penalty supports and the factorized solve
//!
//! A `LinearSystem` is assembled and factorized once for a model; every load
//! set, unit load or imposed dislocation after that is a forward/back
//! substitution against the same factor. The system holds no mutable state, so
//! repeated solves never interfere with each other.

use std::collections::BTreeMap;

use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

use super::SolverOptions;
use crate::elements::MemberEndForces;
use crate::error::{BridgeError, BridgeResult};
use crate::loads::{DistributedLoad, LoadSet};
use crate::math::{
    self, inverse_permutation, reverse_cuthill_mckee, Mat, Mat12, SparseCholeskySolver,
    SparseMatrixBuilder, Vec12,
};
use crate::model::BridgeModel;
use crate::results::{NodeDisplacement, Reactions, Solution};

/// Per-member data kept for load vectors and force recovery
#[derive(Debug, Clone)]
pub struct ElementData {
    pub name: String,
    /// Internal index of the i-node
    pub i: usize,
    /// Internal index of the j-node
    pub j: usize,
    pub length: f64,
    /// Global-to-local transformation
    pub t: Mat12,
    /// Local stiffness
    pub k_local: Mat12,
}

impl ElementData {
    /// Global DOF numbers of the element's twelve end DOFs
    pub fn dofs(&self) -> [usize; 12] {
        std::array::from_fn(|k| {
            if k < 6 {
                6 * self.i + k
            } else {
                6 * self.j + k - 6
            }
        })
    }

    /// Local end displacements from a global displacement vector
    pub fn local_displacements(&self, u: &DVector<f64>) -> Vec12 {
        let u_global = Vec12::from_fn(|k, _| u[self.dofs()[k]]);
        self.t * u_global
    }

    /// Local fixed-end forces of a uniform global load
    fn fixed_end_forces(&self, load: &DistributedLoad) -> (Vec12, [f64; 3]) {
        let r = self.t.fixed_view::<3, 3>(0, 0);
        let w_local = r * nalgebra::Vector3::from(load.as_array());
        let mut fer = Vec12::zeros();
        for axis in 0..3 {
            if w_local[axis].abs() > 0.0 {
                fer += math::fer_uniform_load(w_local[axis], self.length, axis);
            }
        }
        (fer, [w_local[0], w_local[1], w_local[2]])
    }
}

/// An assembled and factorized girder-line system
#[derive(Debug, Clone)]
pub struct LinearSystem {
    node_index: BTreeMap<String, usize>,
    node_names: Vec<String>,
    elements: Vec<ElementData>,
    element_index: BTreeMap<String, usize>,
    stiffness: CsrMatrix<f64>,
    /// Restrained DOFs and their prescribed values
    restrained: BTreeMap<usize, f64>,
    penalty: f64,
    factor: SparseCholeskySolver,
}

impl LinearSystem {
    /// Validate, assemble and factorize a model.
    ///
    /// Geometry problems surface as `InvalidGeometry` before any assembly;
    /// a mechanism the validation cannot see surfaces as `Singularity`.
    pub fn assemble(model: &BridgeModel, options: &SolverOptions) -> BridgeResult<Self> {
        model.validate()?;

        let names: Vec<&String> = model.nodes.keys().collect();
        let position: BTreeMap<&str, usize> = names
            .iter()
            .enumerate()
            .map(|(k, n)| (n.as_str(), k))
            .collect();

        let order: Vec<usize> = if options.reorder {
            let mut adjacency = vec![Vec::new(); names.len()];
            for member in model.members.values() {
                let a = position[member.i_node.as_str()];
                let b = position[member.j_node.as_str()];
                adjacency[a].push(b);
                adjacency[b].push(a);
            }
            reverse_cuthill_mckee(&adjacency)
        } else {
            (0..names.len()).collect()
        };
        let new_index = inverse_permutation(&order);

        let node_index: BTreeMap<String, usize> = names
            .iter()
            .enumerate()
            .map(|(k, n)| ((*n).clone(), new_index[k]))
            .collect();
        let mut node_names = vec![String::new(); names.len()];
        for (name, &idx) in &node_index {
            node_names[idx] = name.clone();
        }

        let n_dofs = 6 * names.len();
        let mut builder = SparseMatrixBuilder::new(n_dofs);
        let mut elements = Vec::with_capacity(model.members.len());
        let mut element_index = BTreeMap::new();

        for (name, member) in &model.members {
            let i_node = model.node(&member.i_node)?;
            let j_node = model.node(&member.j_node)?;
            let material = model.material(&member.material)?;
            let section = model.section(&member.section)?;
            let length = i_node.distance_to(j_node);

            let k_local = member.kind.local_stiffness(material, section, length);
            let t = math::member_transformation_matrix(&i_node.coords(), &j_node.coords(), member.rotation);

            let element = ElementData {
                name: name.clone(),
                i: node_index[&member.i_node],
                j: node_index[&member.j_node],
                length,
                t,
                k_local,
            };
            let k_global = t.transpose() * k_local * t;
            builder.add_element_matrix(&element.dofs(), &k_global);

            element_index.insert(name.clone(), elements.len());
            elements.push(element);
        }

        let stiffness = builder.to_csr();

        let max_diag = stiffness
            .triplet_iter()
            .filter(|(row, col, _)| row == col)
            .fold(0.0_f64, |m, (_, _, v)| m.max(v.abs()));
        let penalty = options.penalty_ratio * max_diag.max(1.0);

        let mut restrained = BTreeMap::new();
        for (node, support) in &model.supports {
            let base = 6 * node_index[node];
            for (dof, value) in support.prescribed() {
                restrained.insert(base + dof.index(), value);
                builder.add(base + dof.index(), base + dof.index(), penalty);
            }
        }

        log::debug!(
            "Assembled girder system: {} DOFs, {} stiffness entries, {} restrained, penalty {:.3e}",
            n_dofs,
            builder.nnz(),
            restrained.len(),
            penalty
        );

        let factor = SparseCholeskySolver::factorized(&builder.to_csr(), options.pivot_tolerance)?;

        Ok(Self {
            node_index,
            node_names,
            elements,
            element_index,
            stiffness,
            restrained,
            penalty,
            factor,
        })
    }

    /// Number of equations
    pub fn n_dofs(&self) -> usize {
        self.factor.size()
    }

    /// Penalty stiffness applied at restrained DOFs
    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    /// Global DOF number of component `k` (0..6) at a node
    pub fn dof(&self, node: &str, k: usize) -> BridgeResult<usize> {
        let idx = self
            .node_index
            .get(node)
            .ok_or_else(|| BridgeError::NodeNotFound(node.to_string()))?;
        Ok(6 * idx + k)
    }

    /// Whether a DOF carries a support restraint
    pub fn is_restrained(&self, dof: usize) -> bool {
        self.restrained.contains_key(&dof)
    }

    /// Assembled element data for a member
    pub fn element(&self, member: &str) -> BridgeResult<&ElementData> {
        self.element_index
            .get(member)
            .map(|&k| &self.elements[k])
            .ok_or_else(|| BridgeError::MemberNotFound(member.to_string()))
    }

    /// Global stiffness matrix before supports are applied (dense copy)
    pub fn stiffness_matrix(&self) -> Mat {
        let mut k = Mat::zeros(self.stiffness.nrows(), self.stiffness.ncols());
        for (row, col, &val) in self.stiffness.triplet_iter() {
            k[(row, col)] += val;
        }
        k
    }

    /// Global load vector of a load set (node loads minus fixed-end forces)
    pub fn load_vector(&self, loads: &LoadSet) -> BridgeResult<DVector<f64>> {
        let mut p = DVector::zeros(self.n_dofs());

        for node in loads.node_loads.keys() {
            let base = self.dof(node, 0)?;
            let total = loads.node_total(node).as_array();
            for k in 0..6 {
                p[base + k] += total[k];
            }
        }

        for member in loads.member_loads.keys() {
            let element = self.element(member)?;
            let (fer_local, _) = element.fixed_end_forces(&loads.member_total(member));
            let fer_global = element.t.transpose() * fer_local;
            for (k, dof) in element.dofs().into_iter().enumerate() {
                p[dof] -= fer_global[k];
            }
        }

        Ok(p)
    }

    /// Equivalent global load of an imposed local end dislocation `d0` on one
    /// member. Solving with it gives the nodal displacements of a structure in
    /// which that member's ends are offset by `-d0` from the nodes they connect.
    pub fn dislocation_load(&self, member: &str, d0: &Vec12) -> BridgeResult<DVector<f64>> {
        let element = self.element(member)?;
        let f = element.t.transpose() * (element.k_local * d0);
        let mut p = DVector::zeros(self.n_dofs());
        for (k, dof) in element.dofs().into_iter().enumerate() {
            p[dof] += f[k];
        }
        Ok(p)
    }

    /// Solve for displacements under a load vector.
    ///
    /// `prescribed` overrides the support value of restrained DOFs for this
    /// solve only (a unit support settlement for a reaction influence line).
    pub fn solve_vector(&self, f: &DVector<f64>, prescribed: &[(usize, f64)]) -> BridgeResult<DVector<f64>> {
        if f.len() != self.n_dofs() {
            return Err(BridgeError::InvalidInput(format!(
                "load vector has {} entries, expected {}",
                f.len(),
                self.n_dofs()
            )));
        }

        let mut rhs = f.clone();
        for (&dof, &value) in &self.restrained {
            rhs[dof] += self.penalty * value;
        }
        for &(dof, value) in prescribed {
            let base = self.restrained.get(&dof).ok_or_else(|| {
                BridgeError::InvalidInput(format!("DOF {dof} is not restrained by a support"))
            })?;
            rhs[dof] += self.penalty * (value - base);
        }

        self.factor.solve(&rhs)
    }

    /// Solve a load set and recover displacements, member forces and reactions
    pub fn solve(&self, loads: &LoadSet) -> BridgeResult<Solution> {
        let u = self.solve_vector(&self.load_vector(loads)?, &[])?;
        self.recover(loads, &u)
    }

    /// Post-process a displacement vector produced for `loads`
    pub fn recover(&self, loads: &LoadSet, u: &DVector<f64>) -> BridgeResult<Solution> {
        let mut solution = Solution {
            load_set: loads.name.clone(),
            ..Solution::default()
        };

        for (idx, name) in self.node_names.iter().enumerate() {
            let d: [f64; 6] = std::array::from_fn(|k| u[6 * idx + k]);
            solution
                .displacements
                .insert(name.clone(), NodeDisplacement::from_array(d));
        }

        let mut nodal_sum = vec![[0.0; 6]; self.node_names.len()];
        for element in &self.elements {
            let load = loads.member_total(&element.name);
            let (fer, w) = element.fixed_end_forces(&load);
            let f = element.k_local * element.local_displacements(u) + fer;

            let f_global = element.t.transpose() * f;
            for k in 0..6 {
                nodal_sum[element.i][k] += f_global[k];
                nodal_sum[element.j][k] += f_global[k + 6];
            }

            solution.member_forces.insert(
                element.name.clone(),
                MemberEndForces {
                    forces: std::array::from_fn(|k| f[k]),
                    length: element.length,
                    wy: w[1],
                },
            );
        }

        for &dof in self.restrained.keys() {
            let (idx, k) = (dof / 6, dof % 6);
            let name = &self.node_names[idx];
            let applied = loads.node_total(name).as_array()[k];
            let entry = solution.reactions.entry(name.clone()).or_default();
            let mut arr = [entry.fx, entry.fy, entry.fz, entry.mx, entry.my, entry.mz];
            arr[k] = nodal_sum[idx][k] - applied;
            *entry = Reactions::from_array(arr);
        }

        Ok(solution)
    }
}
