//!
//! Fixed pieces of C++ written into every program that needs them
//!
//! * `DPTable`: dense table of state vectors over all coordinates
//! * `invert`: Gauss-Jordan inversion used by silent loops of two or more
//!   states
//!
use fnv::FnvHashMap;
use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy)]
pub struct Snippet {
    /// declaration for the header; `None` when the definition itself lives
    /// there
    pub prototype: Option<&'static str>,
    pub definition: &'static str,
}

impl Snippet {
    pub fn definition_lines(&self) -> impl Iterator<Item = &'static str> {
        self.definition.lines()
    }
}

const DP_TABLE: &str = r#"
template<class S, int N> class DPTable {
public:
DPTable() {}
explicit DPTable(const std::array<int,N>& iLen) { init(iLen); }
void init(const std::array<int,N>& iLen) {
size_t iSize = 1;
for (int i = 0; i < N; ++i) { iDim[i] = iLen[i] + 1; iSize *= iDim[i]; }
cells.assign(iSize, S());
}
S& write(const std::array<int,N>& iPos) { return cells[index(iPos)]; }
const S& read(const std::array<int,N>& iPos) const { return cells[index(iPos)]; }
_extreal_ getProb(int iState, const std::array<int,N>& iPos) const { return read(iPos).s[iState]; }
private:
size_t index(const std::array<int,N>& iPos) const {
size_t k = 0;
for (int i = N - 1; i >= 0; --i) k = k * iDim[i] + iPos[i];
return k;
}
std::array<int,N> iDim;
std::vector<S> cells;
};
template<class S, int N> class FoldedDPTable {
public:
FoldedDPTable(const std::array<int,N>& iLen, int iGenerations) {
size_t iSize = 1;
for (int i = 0; i < N; ++i) { iDim[i] = (i == N - 1) ? iGenerations : iLen[i] + 1; iSize *= iDim[i]; }
cells.assign(iSize, S());
}
S& write(const std::array<int,N>& iPos) { return cells[index(iPos)]; }
const S& read(const std::array<int,N>& iPos) const { return cells[index(iPos)]; }
void clear(int iSlow) {
size_t iStride = cells.size() / iDim[N - 1];
size_t iFirst = (iSlow % iDim[N - 1]) * iStride;
std::fill(cells.begin() + iFirst, cells.begin() + iFirst + iStride, S());
}
private:
size_t index(const std::array<int,N>& iPos) const {
size_t k = iPos[N - 1] % iDim[N - 1];
for (int i = N - 2; i >= 0; --i) k = k * iDim[i] + iPos[i];
return k;
}
std::array<int,N> iDim;
std::vector<S> cells;
};
"#;

const INVERT: &str = r#"
void hmmc_invert(const _extreal_* iMatrix, _extreal_* iInverse, int iDim) {
std::vector<_extreal_> a(iMatrix, iMatrix + iDim * iDim);
for (int i = 0; i < iDim * iDim; ++i) iInverse[i] = (i / iDim == i % iDim) ? 1.0 : 0.0;
for (int c = 0; c < iDim; ++c) {
int iPivot = c;
for (int r = c + 1; r < iDim; ++r) {
if (std::abs(a[r * iDim + c]) > std::abs(a[iPivot * iDim + c])) iPivot = r;
}
for (int k = 0; k < iDim; ++k) {
std::swap(a[c * iDim + k], a[iPivot * iDim + k]);
std::swap(iInverse[c * iDim + k], iInverse[iPivot * iDim + k]);
}
_extreal_ iScale = a[c * iDim + c];
for (int k = 0; k < iDim; ++k) {
a[c * iDim + k] /= iScale;
iInverse[c * iDim + k] /= iScale;
}
for (int r = 0; r < iDim; ++r) {
if (r == c) continue;
_extreal_ f = a[r * iDim + c];
for (int k = 0; k < iDim; ++k) {
a[r * iDim + k] -= f * a[c * iDim + k];
iInverse[r * iDim + k] -= f * iInverse[c * iDim + k];
}
}
}
}
"#;

static SNIPPETS: Lazy<FnvHashMap<&'static str, Snippet>> = Lazy::new(|| {
    let mut m = FnvHashMap::default();
    m.insert(
        "DPTable",
        Snippet {
            prototype: None,
            definition: DP_TABLE,
        },
    );
    m.insert(
        "invert",
        Snippet {
            prototype: Some("void hmmc_invert(const _extreal_* iMatrix, _extreal_* iInverse, int iDim);"),
            definition: INVERT,
        },
    );
    m
});

pub fn snippet(name: &str) -> Option<Snippet> {
    SNIPPETS.get(name).copied()
}
