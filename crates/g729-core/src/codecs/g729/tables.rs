//! Read-only codebooks and windows shared by encoder and decoder

use super::basic_op::{Word16, Word32};
use super::constants::{
    GRID_POINTS, L_WINDOW, M, MA_NP, MODE, NC0, NC1, NCAN1, NCAN2, NCODE1, NCODE2, NP,
};

/// Asymmetric LP analysis window (half Hamming, quarter cosine), Q15
pub const HAMWINDOW: [Word16; L_WINDOW] = [
    2621, 2623, 2629, 2638, 2651, 2668, 2689, 2713, 2741, 2772, 2808, 2847, 2890, 2936, 2986,
    3040, 3097, 3158, 3223, 3291, 3363, 3438, 3517, 3599, 3685, 3774, 3867, 3963, 4063, 4166,
    4272, 4382, 4495, 4611, 4731, 4853, 4979, 5108, 5240, 5376, 5514, 5655, 5800, 5947, 6097,
    6250, 6406, 6565, 6726, 6890, 7057, 7227, 7399, 7573, 7750, 7930, 8112, 8296, 8483, 8672,
    8863, 9057, 9252, 9450, 9650, 9852, 10055, 10261, 10468, 10677, 10888, 11101, 11315, 11531,
    11748, 11967, 12187, 12409, 12632, 12856, 13082, 13308, 13536, 13764, 13994, 14225, 14456,
    14688, 14921, 15155, 15389, 15624, 15859, 16095, 16331, 16568, 16805, 17042, 17279, 17516,
    17754, 17991, 18228, 18465, 18702, 18939, 19175, 19411, 19647, 19882, 20117, 20350, 20584,
    20816, 21048, 21279, 21509, 21738, 21967, 22194, 22420, 22644, 22868, 23090, 23311, 23531,
    23749, 23965, 24181, 24394, 24606, 24816, 25024, 25231, 25435, 25638, 25839, 26037, 26234,
    26428, 26621, 26811, 26999, 27184, 27368, 27548, 27727, 27903, 28076, 28247, 28415, 28581,
    28743, 28903, 29061, 29215, 29367, 29515, 29661, 29804, 29944, 30081, 30214, 30345, 30472,
    30597, 30718, 30836, 30950, 31062, 31170, 31274, 31376, 31474, 31568, 31659, 31747, 31831,
    31911, 31988, 32062, 32132, 32198, 32261, 32320, 32376, 32428, 32476, 32521, 32561, 32599,
    32632, 32662, 32688, 32711, 32729, 32744, 32755, 32763, 32767, 32767, 32741, 32665, 32537,
    32359, 32129, 31850, 31521, 31143, 30716, 30242, 29720, 29151, 28538, 27879, 27177, 26433,
    25647, 24821, 23957, 23055, 22117, 21145, 20139, 19102, 18036, 16941, 15820, 14674, 13505,
    12315, 11106, 9879, 8637, 7381, 6114, 4838, 3554, 2264, 971,
];

/// Lag window (60 Hz gaussian bandwidth expansion), DPF high part
pub const LAG_H: [Word16; NP] = [
    32728, 32619, 32438, 32187, 31867, 31480, 31029, 30517, 29946, 29321, 28645, 27923,
];

/// Lag window, DPF low part
pub const LAG_L: [Word16; NP] = [
    11904, 17280, 30720, 25856, 24192, 28992, 24384, 7360, 19520, 14784, 22080, 12928,
];

/// Cosine grid of the LP to LSP root search, Q15
pub const GRID: [Word16; GRID_POINTS + 1] = [
    32760, 32703, 32509, 32187, 31738, 31164, 30466, 29649, 28714, 27666, 26509, 25248, 23886,
    22431, 20887, 19260, 17557, 15786, 13951, 12062, 10125, 8149, 6140, 4106, 2057, 0, -2057,
    -4106, -6140, -8149, -10125, -12062, -13951, -15786, -17557, -19260, -20887, -22431, -23886,
    -25248, -26509, -27666, -28714, -29649, -30466, -31164, -31738, -32187, -32509, -32703,
    -32760,
];

/// `cos(i*pi/64)` in Q15 with one guard entry, used by the Q15 LSF mapping
pub const TABLE: [Word16; 65] = [
    32767, 32729, 32610, 32413, 32138, 31786, 31357, 30853, 30274, 29622, 28899, 28106, 27246,
    26320, 25330, 24279, 23170, 22006, 20788, 19520, 18205, 16846, 15447, 14010, 12540, 11039,
    9512, 7962, 6393, 4808, 3212, 1608, 0, -1608, -3212, -4808, -6393, -7962, -9512, -11039,
    -12540, -14010, -15447, -16846, -18205, -19520, -20788, -22006, -23170, -24279, -25330,
    -26320, -27246, -28106, -28899, -29622, -30274, -30853, -31357, -31786, -32138, -32413,
    -32610, -32729, -32768,
];

/// Inverse slope of [`TABLE`], Q12
pub const SLOPE: [Word16; 64] = [
    -26887, -8812, -5323, -3813, -2979, -2444, -2081, -1811, -1608, -1450, -1322, -1219, -1132,
    -1059, -998, -946, -901, -861, -827, -797, -772, -750, -730, -713, -699, -687, -677, -668,
    -662, -657, -654, -652, -652, -654, -657, -662, -668, -677, -687, -699, -713, -730, -750,
    -772, -797, -827, -861, -901, -946, -998, -1059, -1132, -1219, -1322, -1450, -1608, -1811,
    -2081, -2444, -2979, -3813, -5323, -8812, -26887,
];

/// `cos(i*pi/64)` in Q15, used by the Q13 LSF mapping
pub const TABLE2: [Word16; 64] = [
    32767, 32729, 32610, 32413, 32138, 31786, 31357, 30853, 30274, 29622, 28899, 28106, 27246,
    26320, 25330, 24279, 23170, 22006, 20788, 19520, 18205, 16846, 15447, 14010, 12540, 11039,
    9512, 7962, 6393, 4808, 3212, 1608, 0, -1608, -3212, -4808, -6393, -7962, -9512, -11039,
    -12540, -14010, -15447, -16846, -18205, -19520, -20788, -22006, -23170, -24279, -25330,
    -26320, -27246, -28106, -28899, -29622, -30274, -30853, -31357, -31786, -32138, -32413,
    -32610, -32729,
];

/// Slope of [`TABLE2`], Q12 per table step
pub const SLOPE_COS: [Word16; 64] = [
    -632, -1893, -3150, -4399, -5638, -6863, -8072, -9261, -10428, -11570, -12684, -13767,
    -14817, -15832, -16808, -17744, -18637, -19486, -20287, -21039, -21741, -22390, -22986,
    -23526, -24009, -24435, -24801, -25108, -25354, -25540, -25664, -25726, -25726, -25664,
    -25540, -25354, -25108, -24801, -24435, -24009, -23526, -22986, -22390, -21741, -21039,
    -20287, -19486, -18637, -17744, -16808, -15832, -14817, -13767, -12684, -11570, -10428,
    -9261, -8072, -6863, -5638, -4399, -3150, -1893, -632,
];

/// Inverse slope of [`TABLE2`], Q12
pub const SLOPE_ACOS: [Word16; 64] = [
    -26887, -8812, -5323, -3813, -2979, -2444, -2081, -1811, -1608, -1450, -1322, -1219, -1132,
    -1059, -998, -946, -901, -861, -827, -797, -772, -750, -730, -713, -699, -687, -677, -668,
    -662, -657, -654, -652, -652, -654, -657, -662, -668, -677, -687, -699, -713, -730, -750,
    -772, -797, -827, -861, -901, -946, -998, -1059, -1132, -1219, -1322, -1450, -1608, -1811,
    -2081, -2444, -2979, -3813, -5323, -8812, -26887,
];

/// 1/3 resolution interpolation filter (hamming windowed sinc), Q15
pub const INTER_3L: [Word16; 31] = [
    29443, 25207, 14701, 3143, -4402, -5850, -2783, 1211, 3130, 2259, 0, -1652, -1666, -464, 756,
    1099, 550, -245, -634, -451, 0, 308, 296, 78, -120, -165, -79, 34, 91, 63, 0,
];

/// Pitch delay to 40-sample error zone, `tab_zone[i] = (i + 2) / 40`
pub const TAB_ZONE: [Word16; 153] = {
    let mut t = [0; 153];
    let mut i = 0;
    while i < 153 {
        t[i] = ((i + 2) / 40) as Word16;
        i += 1;
    }
    t
};

/// First stage LSF codebook, Q13
pub const LSPCB1: [[Word16; M]; NC0] = [
    [1486, 2168, 3751, 9074, 12134, 13944, 17983, 19173, 21190, 21820],
    [1730, 2640, 3450, 4870, 6126, 7876, 15644, 17817, 20294, 21902],
    [1568, 2256, 3088, 4874, 11063, 13393, 18307, 19293, 21109, 21741],
    [1733, 2512, 3357, 4708, 6977, 10296, 17024, 17956, 19145, 20350],
    [1744, 2436, 3308, 8731, 10432, 12007, 15614, 16639, 21359, 21913],
    [1786, 2369, 3372, 4521, 6795, 12963, 17674, 18988, 20855, 21640],
    [1631, 2433, 3361, 6328, 10709, 12013, 13277, 13904, 19441, 21088],
    [1489, 2364, 3291, 6250, 9227, 10403, 13843, 15278, 17721, 21451],
    [1869, 2533, 3475, 4365, 9152, 14513, 15908, 17022, 20611, 21411],
    [2070, 3025, 4333, 5854, 7805, 9231, 10597, 16047, 20109, 21834],
    [1910, 2673, 3419, 4261, 11168, 15111, 16577, 17591, 19310, 20265],
    [1141, 1815, 2624, 4623, 6495, 9588, 13968, 16428, 19351, 21286],
    [2192, 3171, 4707, 5808, 10904, 12500, 14162, 15664, 21124, 21789],
    [1286, 1907, 2548, 3453, 9574, 11964, 15978, 17344, 19691, 22495],
    [1921, 2720, 4604, 6684, 11503, 12992, 14350, 15262, 16997, 20791],
    [2052, 2759, 3897, 5246, 6638, 10267, 15834, 16814, 18149, 21675],
    [1798, 2497, 5617, 11449, 13189, 14711, 17050, 18195, 20307, 21182],
    [1009, 1647, 2889, 5709, 9541, 12354, 15231, 18494, 20966, 22033],
    [3016, 3794, 4606, 5553, 7010, 8834, 11891, 16001, 18966, 21426],
    [2121, 2928, 4247, 5562, 8042, 10578, 11950, 14075, 19003, 21386],
    [1672, 2418, 3211, 4287, 7297, 12574, 15232, 18026, 19822, 21151],
    [2245, 3112, 4082, 4920, 6108, 8233, 14452, 16936, 20197, 21741],
    [1851, 2511, 3179, 3849, 8107, 14125, 16309, 17601, 19442, 21180],
    [1709, 2362, 3181, 6151, 8609, 10141, 11697, 15093, 18789, 21245],
    [2140, 3130, 4164, 6019, 8055, 9669, 12140, 13683, 16418, 20967],
    [1702, 2358, 4013, 9013, 10823, 13155, 16285, 18085, 20051, 20794],
    [1825, 2593, 3373, 5213, 8050, 13134, 15045, 16296, 20170, 21546],
    [2026, 2736, 3618, 4535, 5574, 7034, 9773, 16153, 19716, 21437],
    [2084, 3175, 4379, 5529, 6720, 8201, 16234, 17850, 20179, 21598],
    [2168, 3033, 4054, 5147, 7046, 8752, 10419, 12327, 20232, 21739],
    [1697, 2502, 3549, 5043, 6993, 8625, 14049, 15930, 18025, 21652],
    [2200, 3163, 4087, 5117, 6336, 7781, 10011, 12153, 18236, 21537],
    [1853, 2577, 3371, 4225, 7339, 12133, 13816, 15251, 17706, 21281],
    [1574, 2245, 2882, 3642, 4921, 9768, 14963, 16793, 19290, 21436],
    [1917, 2617, 3471, 5166, 7458, 9041, 10583, 16470, 20028, 21406],
    [1957, 2742, 4022, 5508, 8216, 9911, 11318, 12664, 18041, 20831],
    [1728, 2427, 4210, 7766, 10125, 13014, 14803, 16045, 17895, 21315],
    [1808, 2606, 3468, 4455, 6050, 8788, 14826, 16394, 18040, 21454],
    [2125, 3043, 3849, 4708, 6175, 7834, 9566, 15380, 19294, 21505],
    [1803, 2536, 3282, 4194, 6006, 7580, 9390, 13912, 18866, 21467],
    [1640, 2446, 3493, 6147, 10270, 11893, 13298, 14651, 17209, 21126],
    [1846, 2636, 3453, 4469, 8170, 10126, 11586, 14089, 16879, 20958],
    [1989, 2790, 3634, 4630, 6082, 8659, 10937, 14138, 18180, 21264],
    [1707, 2460, 3282, 6106, 8567, 9923, 11256, 12829, 16917, 21077],
    [2198, 3078, 3946, 4811, 6016, 7469, 9146, 12286, 18283, 20852],
    [1723, 2369, 3076, 4212, 8022, 11028, 12478, 13841, 17919, 21249],
    [2174, 3101, 4059, 5013, 6259, 8182, 10116, 12158, 15306, 20625],
    [1889, 2695, 3484, 4356, 5500, 8060, 12006, 14268, 16766, 20937],
    [1513, 2180, 2950, 4453, 8516, 11122, 12689, 15186, 19139, 21154],
    [1930, 2672, 3417, 4191, 5286, 6714, 11950, 15711, 18703, 20833],
    [1893, 2676, 3626, 5213, 7303, 8986, 10409, 11750, 17519, 21307],
    [1637, 2313, 3022, 4021, 8432, 10815, 12380, 13718, 15736, 20879],
    [2159, 3087, 4011, 4885, 6063, 7616, 9357, 11133, 15102, 21023],
    [1775, 2462, 3180, 4161, 6779, 9074, 10572, 12095, 17466, 21186],
    [2122, 2976, 3852, 4736, 5904, 7436, 9022, 10748, 13473, 20373],
    [1917, 2721, 3555, 4393, 5439, 6808, 9652, 13296, 17206, 20928],
    [1696, 2484, 3427, 5219, 9296, 10983, 12311, 13594, 15419, 20520],
    [1880, 2608, 3338, 4236, 6893, 8695, 10130, 11620, 14948, 21000],
    [2040, 2830, 3652, 4473, 5631, 7121, 8613, 10361, 15286, 20818],
    [1697, 2386, 3116, 4128, 6463, 8279, 9715, 11224, 14219, 21244],
    [2130, 2984, 3815, 4652, 5715, 7102, 8595, 10254, 12643, 20211],
    [1891, 2609, 3434, 4416, 5812, 7438, 9102, 10961, 13780, 20812],
    [1683, 2372, 3173, 4424, 6622, 8118, 9512, 10967, 13420, 20598],
    [2033, 2829, 3615, 4440, 5523, 6886, 8400, 10099, 12328, 19906],
    [1459, 2146, 3245, 7020, 10185, 11849, 14109, 15926, 18224, 20816],
    [1598, 2313, 3091, 4044, 5394, 8770, 14592, 16447, 19099, 21286],
    [1655, 2327, 3115, 5049, 9232, 11089, 13155, 15173, 17981, 21089],
    [1796, 2440, 3181, 4023, 5107, 7125, 12998, 15452, 18436, 21197],
    [1576, 2252, 3122, 5728, 8581, 10204, 12074, 15028, 18545, 21101],
    [1844, 2599, 3412, 4319, 5631, 7563, 10389, 14599, 18232, 21218],
    [1668, 2330, 3045, 4127, 7117, 9349, 11093, 14164, 17950, 21185],
    [1880, 2604, 3365, 4209, 5320, 6915, 9004, 12876, 17871, 21146],
    [1509, 2197, 2994, 4855, 8740, 10725, 12677, 15120, 17621, 20942],
    [1812, 2559, 3351, 4226, 5440, 7613, 11693, 14422, 17285, 21076],
    [1590, 2259, 2942, 4089, 7418, 9637, 11306, 13725, 16957, 20955],
    [1806, 2565, 3378, 4263, 5488, 7279, 9697, 12838, 16906, 21042],
    [1648, 2378, 3296, 5393, 8359, 10049, 11787, 14003, 16707, 20857],
    [1786, 2523, 3339, 4313, 5749, 7658, 10117, 12811, 16325, 20890],
    [1611, 2285, 3021, 4162, 6926, 8982, 10662, 12892, 16034, 20859],
    [1850, 2626, 3421, 4272, 5397, 6991, 9160, 12037, 15873, 20871],
    [1362, 2026, 2786, 4493, 7801, 10112, 12688, 15293, 18044, 20767],
    [1664, 2378, 3136, 4037, 5299, 7738, 12328, 15170, 18097, 20962],
    [1512, 2210, 2972, 4359, 7747, 10045, 12117, 14547, 17500, 20791],
    [1748, 2477, 3236, 4107, 5238, 7143, 10692, 14205, 17620, 20940],
    [1494, 2181, 2908, 4233, 7469, 9612, 11457, 14012, 17346, 20830],
    [1715, 2446, 3207, 4080, 5224, 6992, 9777, 13491, 17285, 20853],
    [1453, 2147, 2975, 5016, 8257, 10247, 12067, 14326, 17106, 20689],
    [1674, 2397, 3175, 4069, 5322, 7240, 10258, 13457, 16826, 20702],
    [1538, 2221, 2943, 4117, 7204, 9255, 10990, 13341, 16534, 20571],
    [1712, 2438, 3208, 4067, 5190, 6921, 9386, 12700, 16498, 20640],
    [1474, 2157, 3000, 5082, 8120, 9965, 11665, 13751, 16323, 20517],
    [1682, 2394, 3151, 4049, 5319, 7189, 9794, 12682, 15904, 20494],
    [1542, 2228, 2944, 4165, 7009, 8994, 10653, 12824, 15852, 20439],
    [1719, 2444, 3201, 4052, 5190, 6865, 9155, 12132, 15734, 20446],
    [1348, 2006, 2770, 4642, 8145, 10362, 12404, 14747, 17371, 20516],
    [1580, 2283, 3040, 3950, 5215, 7598, 11720, 14664, 17466, 20637],
    [1446, 2125, 2863, 4366, 7798, 10024, 11937, 14217, 16888, 20458],
    [1629, 2343, 3101, 3990, 5177, 7182, 10572, 13822, 16971, 20566],
    [1421, 2097, 2850, 4407, 7625, 9693, 11521, 13741, 16625, 20347],
    [1588, 2307, 3070, 3978, 5194, 7089, 9959, 13168, 16414, 20391],
    [1416, 2093, 2900, 4886, 7975, 9893, 11640, 13652, 16167, 20206],
    [1578, 2283, 3034, 3953, 5270, 7288, 10038, 12888, 15872, 20133],
    [1466, 2143, 2865, 4162, 7077, 9097, 10813, 12972, 15918, 20125],
    [1623, 2343, 3109, 3996, 5162, 6916, 9424, 12429, 15706, 20170],
    [1411, 2088, 2883, 4821, 7797, 9677, 11367, 13384, 15893, 19957],
    [1562, 2270, 3020, 3947, 5271, 7200, 9731, 12419, 15357, 19849],
    [1486, 2160, 2878, 4118, 6871, 8789, 10432, 12521, 15413, 19869],
    [1619, 2339, 3101, 3993, 5153, 6848, 9142, 11884, 15119, 19809],
    [1297, 1954, 2727, 4747, 8059, 10175, 12124, 14342, 16801, 19944],
    [1495, 2197, 2956, 3866, 5109, 7454, 11134, 13897, 16640, 20098],
    [1385, 2060, 2811, 4469, 7649, 9698, 11624, 13751, 16221, 19837],
    [1549, 2261, 3021, 3905, 5132, 7251, 10409, 13276, 16213, 19941],
    [1357, 2032, 2805, 4537, 7547, 9446, 11173, 13206, 15828, 19693],
    [1515, 2230, 3006, 3903, 5129, 7053, 9688, 12511, 15407, 19612],
    [1364, 2045, 2864, 4863, 7770, 9546, 11219, 13148, 15586, 19543],
    [1512, 2222, 2975, 3899, 5222, 7232, 9680, 12291, 15086, 19365],
    [1419, 2099, 2833, 4215, 7014, 8852, 10512, 12552, 15225, 19262],
    [1566, 2289, 3062, 3950, 5118, 6891, 9191, 11839, 14814, 19253],
    [1343, 2023, 2822, 4756, 7628, 9421, 11073, 12976, 15322, 19087],
    [1497, 2207, 2963, 3889, 5220, 7208, 9516, 11937, 14653, 18889],
    [1443, 2123, 2854, 4155, 6776, 8602, 10226, 12199, 14861, 18784],
    [1586, 2314, 3093, 3981, 5115, 6822, 9006, 11468, 14362, 18594],
    [1233, 1895, 2717, 4832, 7764, 9650, 11485, 13472, 15845, 18843],
    [1417, 2114, 2903, 3849, 5165, 7512, 10606, 13036, 15579, 18681],
    [1312, 1989, 2778, 4503, 7338, 9245, 10981, 12929, 15294, 18488],
    [1457, 2166, 2938, 3836, 5105, 7210, 9909, 12347, 14832, 18388],
    [1391, 2076, 2841, 4352, 7141, 8980, 10704, 12651, 15104, 18250],
    [1540, 2257, 3019, 3923, 5195, 7039, 9376, 11823, 14616, 18131],
];

/// Second and third stage LSF codebook (lower and upper half), Q13
pub const LSPCB2: [[Word16; M]; NC1] = [
    [-435, -815, -742, 1033, -518, 582, -1201, 829, 86, 385],
    [-833, -891, 463, -8, -1251, 1450, 72, -231, 864, 661],
    [-1021, 231, -306, 321, -220, -163, -526, -754, -1633, 267],
    [57, -198, -339, -33, -1468, 573, 796, -169, -631, 816],
    [171, -350, 294, 1660, 453, 519, 291, 159, -640, -1296],
    [-701, -842, -58, 950, 892, 1549, 715, 527, -714, -193],
    [584, 31, -289, 356, -333, -457, 612, -283, -1381, -741],
    [-109, -808, 231, 77, -87, -344, 1341, 1087, -654, -569],
    [-859, 1236, 550, 854, 714, -543, -1752, -195, -98, -276],
    [-877, -954, -1248, -299, 212, -235, -728, 949, 1517, 895],
    [-77, 344, -620, 763, 413, 502, -362, -960, -483, 1386],
    [-314, -307, -256, -1260, -429, 450, -466, -108, 1010, 2223],
    [711, 693, 521, 650, 1305, -28, -378, 744, -1005, 240],
    [-112, -271, -500, 946, 1733, 271, -15, 909, -259, 1688],
    [575, -10, -468, -199, 1101, -1011, 581, -53, -747, 878],
    [145, -285, -1280, -398, 36, -498, -1377, 18, -444, 1483],
    [-1133, -835, 1350, 1284, -95, 1015, -222, 443, 372, -354],
    [-1459, -1237, 416, -213, 466, 669, 659, 1640, 932, 534],
    [-15, 66, 468, 1019, -748, 1385, -182, -907, -721, -262],
    [-338, 148, 1445, 75, -760, 569, 1247, 337, 416, -121],
    [389, 239, 1568, 981, 113, 369, -1003, -507, -587, -904],
    [-312, -98, 949, 31, 1104, 72, -141, 1465, 63, -785],
    [1127, 584, 835, 277, -1159, 208, 301, -882, 117, -404],
    [539, 363, -33, 373, -79, -1057, -883, -476, 1032, -53],
    [-1089, -429, -1030, -1227, 453, 697, 364, -398, -1096, 1027],
    [-1106, -600, -1015, -580, 1090, -319, 740, 376, 445, -420],
    [-52, -723, 1153, -402, -347, 1165, 1196, 1076, -1032, 343],
    [367, 1043, -134, -1078, 478, 1220, -1219, -361, 1107, 1030],
    [-1062, 1048, -1227, 284, 1230, -1071, 1160, 420, 201, -186],
    [-231, 1179, 1056, 1296, -340, 234, 474, 1155, 1027, -1077],
    [-580, 1120, 432, -632, -1210, -293, 1221, 1213, -216, 437],
    [733, 849, 1105, -357, 1056, 1230, 318, 1211, -523, -1067],
];

/// MA predictor coefficients of the two LSF prediction modes, Q15
pub const FG: [[[Word16; M]; MA_NP]; MODE] = [
    [
        [8421, 9109, 9175, 8965, 9034, 9057, 8765, 8775, 9106, 8673],
        [7018, 7189, 7638, 7307, 7444, 7379, 7038, 6956, 6930, 6868],
        [5472, 4990, 5134, 5177, 5246, 5141, 5206, 5095, 4830, 5147],
        [4056, 3031, 2614, 3024, 2916, 2713, 3309, 3237, 2857, 3473],
    ],
    [
        [7733, 7880, 8188, 8175, 8247, 8490, 9637, 10044, 10330, 10705],
        [4211, 2428, 1461, 2212, 3120, 3097, 3509, 3408, 2903, 3051],
        [2585, 1226, 419, 1422, 2025, 1953, 2068, 1966, 1347, 1314],
        [3654, 2901, 2928, 3615, 2950, 2769, 2399, 2130, 2145, 1990],
    ],
];

/// `1 - sum(FG)` per mode, Q15
pub const FG_SUM: [[Word16; M]; MODE] = [
    [7798, 8447, 8205, 8293, 8126, 8477, 8447, 8703, 9043, 8604],
    [14585, 18333, 19772, 17344, 16426, 16459, 15155, 15220, 16043, 15708],
];

/// Inverse of [`FG_SUM`], Q12
pub const FG_SUM_INV: [[Word16; M]; MODE] = [
    [17210, 15888, 16357, 16183, 16516, 15833, 15888, 15421, 14840, 15597],
    [9202, 7320, 6788, 7738, 8170, 8154, 8856, 8818, 8366, 8544],
];

/// Initial quantized LSF history, Q13
pub const FREQ_PREV_RESET: [Word16; M] =
    [2339, 4679, 7018, 9358, 11698, 14037, 16377, 18717, 21056, 23396];

/// Initial LSPs of encoder and decoder, Q15
pub const LSP_RESET: [Word16; M] = [
    30000, 26000, 21000, 15000, 8000, 0, -8000, -15000, -21000, -26000,
];

/// MA prediction coefficients of the fixed codebook gain, Q13
pub const PRED: [Word16; 4] = [5571, 4751, 2785, 1556];

/// First gain codebook `{adaptive Q14, fixed correction Q13}`
pub const GBK1: [[Word16; 2]; NCODE1] = [
    [1, 1516],
    [1551, 2425],
    [1831, 5022],
    [57, 5404],
    [1921, 9291],
    [3242, 9949],
    [356, 14756],
    [2678, 27162],
];

/// Second gain codebook `{adaptive Q14, fixed correction Q13}`
pub const GBK2: [[Word16; 2]; NCODE2] = [
    [826, 2005],
    [1994, 0],
    [5142, 592],
    [6160, 2395],
    [8091, 4861],
    [9120, 525],
    [10573, 2966],
    [11569, 1196],
    [13260, 3256],
    [14194, 1630],
    [15132, 4914],
    [15161, 14276],
    [15434, 237],
    [16112, 3392],
    [17299, 1861],
    [18973, 5935],
];

/// Sorted search position to codebook index, first gain codebook
pub const MAP1: [Word16; NCODE1] = [5, 1, 4, 7, 3, 0, 6, 2];
/// Transmitted index to codebook entry, first gain codebook
pub const IMAP1: [Word16; NCODE1] = [5, 1, 7, 4, 2, 0, 6, 3];
/// Sorted search position to codebook index, second gain codebook
pub const MAP2: [Word16; NCODE2] = [4, 6, 0, 2, 12, 14, 8, 10, 15, 11, 9, 13, 7, 3, 1, 5];
/// Transmitted index to codebook entry, second gain codebook
pub const IMAP2: [Word16; NCODE2] = [2, 14, 3, 13, 0, 15, 1, 12, 6, 10, 7, 9, 4, 11, 5, 8];

/// Pre-selection thresholds of the first gain codebook, Q14
pub const THR1: [Word16; NCODE1 - NCAN1] = [10808, 12374, 19778, 32567];
/// Pre-selection thresholds of the second gain codebook, Q15
pub const THR2: [Word16; NCODE2 - NCAN2] = [14087, 16188, 20274, 21321, 23525, 25232, 27873, 30542];

/// Least-squares pre-selection coefficients
pub const COEF: [[Word16; 2]; 2] = [[31881, 26416], [31548, 27816]];
pub const L_COEF: [[Word32; 2]; 2] = [[2089405952, 1731217536], [2067549984, 1822990272]];
